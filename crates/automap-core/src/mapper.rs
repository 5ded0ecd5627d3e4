//! Mapping orchestration: structural copy followed by overrides.

use std::any::{TypeId, type_name};
use std::sync::Arc;

use automap_model::{MapperOptions, Record, Shape};

use crate::copier::StructuralCopier;
use crate::error::{MapError, Result};
use crate::registry::MappingRegistry;

/// Maps values between shapes using a shared [`MappingRegistry`].
///
/// Every call runs the structural copy first and then the override entries
/// of the requested configuration that were registered for exactly the
/// mapped `(S, D)` pair, in registration order.
#[derive(Debug)]
pub struct Mapper {
    registry: Arc<MappingRegistry>,
    copier: StructuralCopier,
}

impl Mapper {
    /// Creates a mapper with default options.
    pub fn new(registry: impl Into<Arc<MappingRegistry>>) -> Self {
        Self::with_options(registry, MapperOptions::default())
    }

    pub fn with_options(registry: impl Into<Arc<MappingRegistry>>, options: MapperOptions) -> Self {
        Self {
            registry: registry.into(),
            copier: StructuralCopier::new(options),
        }
    }

    pub fn registry(&self) -> &MappingRegistry {
        &self.registry
    }

    pub fn options(&self) -> &MapperOptions {
        self.copier.options()
    }

    /// Maps `source` into a freshly created `D`.
    ///
    /// An absent source yields `D::default()` untouched: neither the copy
    /// nor any override runs.
    pub fn map<S: Shape, D: Shape>(&self, source: Option<&S>, config: &str) -> Result<D> {
        let mut destination = D::default();
        self.map_into(source, Some(&mut destination), config)?;
        Ok(destination)
    }

    /// Maps `source` into an existing `destination`.
    ///
    /// Destination fields without a readable counterpart in the source are
    /// left as they are. If either operand is absent the call does nothing.
    pub fn map_into<S: Shape, D: Shape>(
        &self,
        source: Option<&S>,
        destination: Option<&mut D>,
        config: &str,
    ) -> Result<()> {
        let (Some(source), Some(destination)) = (source, destination) else {
            tracing::debug!(
                source = type_name::<S>(),
                destination = type_name::<D>(),
                "Null operand, mapping skipped"
            );
            return Ok(());
        };

        self.copier.copy(
            Some(source as &dyn Record),
            Some(&mut *destination as &mut dyn Record),
        )?;
        self.apply_overrides(source, destination, config)
    }

    fn apply_overrides<S: Shape, D: Shape>(
        &self,
        source: &S,
        destination: &mut D,
        config: &str,
    ) -> Result<()> {
        let entries = self.registry.resolve(config);
        if entries.is_empty() {
            tracing::trace!(config, "No overrides registered");
            return Ok(());
        }

        let pair = (TypeId::of::<S>(), TypeId::of::<D>());
        for (index, entry) in entries.iter().enumerate() {
            if !entry.applies_to(pair.0, pair.1) {
                tracing::trace!(
                    config,
                    index,
                    source = %entry.source_type(),
                    destination = %entry.destination_type(),
                    "Override not applicable"
                );
                continue;
            }
            entry
                .invoke(source, &mut *destination)
                .map_err(|err| MapError::Override {
                    config: config.to_string(),
                    index,
                    source: err,
                })?;
            tracing::trace!(config, index, "Override applied");
        }
        Ok(())
    }
}
