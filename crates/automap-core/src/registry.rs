//! Named override configurations.
//!
//! A configuration is an ordered list of override functions, each tied to
//! one (source shape, destination shape) pair. The registry is populated
//! once through chained registration calls and is read-only afterwards;
//! only the per-entry usage counters change.
//!
//! # Example
//!
//! ```ignore
//! let registry = MappingRegistry::new()
//!     .register("Default", |src: &Person, dst: &mut PersonDto| {
//!         dst.name = src.name.to_uppercase();
//!     })
//!     .register("Default", |src: &Person, dst: &mut PersonDto| {
//!         dst.display_name = format!("{} ({})", src.name, src.age);
//!     });
//!
//! assert_eq!(registry.resolve("Default").len(), 2);
//! ```

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use automap_model::{Shape, TypeInfo, layout_of};

use crate::report::{ConfigurationUsage, OverrideUsage, UsageReport};

/// Configuration name used when the caller does not choose one.
pub const DEFAULT_CONFIG: &str = "Default";

type OverrideFn = dyn Fn(&dyn Any, &mut dyn Any) -> Option<anyhow::Result<()>> + Send + Sync;

/// One registered override function and its usage counter.
pub struct OverrideEntry {
    source: TypeInfo,
    destination: TypeInfo,
    apply: Box<OverrideFn>,
    usage: AtomicU64,
}

impl OverrideEntry {
    fn new<S, D, F>(apply: F) -> Self
    where
        S: Shape,
        D: Shape,
        F: Fn(&S, &mut D) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let apply = move |source: &dyn Any, destination: &mut dyn Any| {
            let source = source.downcast_ref::<S>()?;
            let destination = destination.downcast_mut::<D>()?;
            Some(apply(source, destination))
        };
        Self {
            source: TypeInfo::of::<S>(),
            destination: TypeInfo::of::<D>(),
            apply: Box::new(apply),
            usage: AtomicU64::new(0),
        }
    }

    pub fn source_type(&self) -> TypeInfo {
        self.source
    }

    pub fn destination_type(&self) -> TypeInfo {
        self.destination
    }

    /// Returns true when the entry was registered for exactly this pair.
    pub fn applies_to(&self, source: TypeId, destination: TypeId) -> bool {
        self.source.id() == source && self.destination.id() == destination
    }

    /// Number of successful invocations so far.
    pub fn usage_count(&self) -> u64 {
        self.usage.load(Ordering::Relaxed)
    }

    /// Runs the override against a (source, destination) pair.
    ///
    /// Returns `Ok(false)` without running anything when the runtime types
    /// do not match the registered pair. The usage counter is incremented
    /// only when the function ran and succeeded.
    pub fn invoke(&self, source: &dyn Any, destination: &mut dyn Any) -> anyhow::Result<bool> {
        match (self.apply)(source, destination) {
            None => Ok(false),
            Some(result) => {
                result?;
                self.usage.fetch_add(1, Ordering::Relaxed);
                Ok(true)
            }
        }
    }
}

impl fmt::Debug for OverrideEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverrideEntry")
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("usage_count", &self.usage_count())
            .finish_non_exhaustive()
    }
}

/// Registry of override configurations indexed by name.
#[derive(Debug, Default)]
pub struct MappingRegistry {
    configurations: HashMap<String, Vec<OverrideEntry>>,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an override for the `S -> D` pair to configuration `config`.
    ///
    /// Entries are never replaced or deduplicated: two registrations for the
    /// same pair both run, in registration order.
    #[must_use]
    pub fn register<S, D, F>(self, config: impl Into<String>, apply: F) -> Self
    where
        S: Shape,
        D: Shape,
        F: Fn(&S, &mut D) + Send + Sync + 'static,
    {
        self.try_register(config, move |source: &S, destination: &mut D| {
            apply(source, destination);
            Ok(())
        })
    }

    /// Like [`Self::register`], for override functions that can fail.
    ///
    /// A failure aborts the mapping call and is returned to its caller.
    #[must_use]
    pub fn try_register<S, D, F>(mut self, config: impl Into<String>, apply: F) -> Self
    where
        S: Shape,
        D: Shape,
        F: Fn(&S, &mut D) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let config = config.into();

        // Build both shape tables now instead of on the first mapping call.
        layout_of::<S>();
        layout_of::<D>();

        let entries = self.configurations.entry(config.clone()).or_default();
        entries.push(OverrideEntry::new(apply));
        tracing::debug!(
            config = %config,
            source = type_name::<S>(),
            destination = type_name::<D>(),
            position = entries.len() - 1,
            "Registered override"
        );
        self
    }

    /// Entries of `config` in registration order; empty when unknown.
    pub fn resolve(&self, config: &str) -> &[OverrideEntry] {
        self.configurations
            .get(config)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn contains(&self, config: &str) -> bool {
        self.configurations.contains_key(config)
    }

    /// Returns an iterator over all registered configuration names.
    pub fn config_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.configurations.keys().map(String::as_str)
    }

    /// Returns the number of configurations.
    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }

    /// Snapshot of the usage counters, sorted by configuration name.
    pub fn usage_report(&self) -> UsageReport {
        let mut configurations: Vec<ConfigurationUsage> = self
            .configurations
            .iter()
            .map(|(name, entries)| ConfigurationUsage {
                name: name.clone(),
                overrides: entries
                    .iter()
                    .map(|entry| OverrideUsage {
                        source: entry.source.name().to_string(),
                        destination: entry.destination.name().to_string(),
                        usage_count: entry.usage_count(),
                    })
                    .collect(),
            })
            .collect();
        configurations.sort_by(|a, b| a.name.cmp(&b.name));
        UsageReport { configurations }
    }
}
