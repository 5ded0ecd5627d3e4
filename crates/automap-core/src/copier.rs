//! Structural copy between shapes.
//!
//! Fields are matched by name: a destination field is written only when the
//! source declares a readable field and the destination a writable field of
//! the same name. Values are cloned, sequences are rebuilt from the source
//! elements (a shallow copy, elements are never mapped themselves), and
//! nested records are copied recursively into the destination's own
//! instance.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use automap_model::{
    AbsentValuePolicy, AssignError, FieldDescriptor, FieldKind, FieldValue, Layout, MapperOptions,
    Record,
};

use crate::error::{MapError, Result};

/// A source field and the same-named destination field it is copied into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPair {
    pub name: &'static str,
    /// Index into the source layout.
    pub source: usize,
    /// Index into the destination layout.
    pub destination: usize,
    /// Declared types allow the assignment.
    pub compatible: bool,
}

/// Field correspondence between one source shape and one destination shape.
#[derive(Debug)]
pub struct CopyPlan {
    source: Arc<Layout>,
    destination: Arc<Layout>,
    pairs: Vec<FieldPair>,
}

impl CopyPlan {
    /// Pairs every readable source field with the writable destination
    /// field of the same name, in source declaration order.
    pub fn build(source: Arc<Layout>, destination: Arc<Layout>) -> Self {
        let pairs = source
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, field)| field.readable)
            .filter_map(|(index, field)| {
                let target = destination.position(field.name)?;
                let target_field = &destination.fields()[target];
                target_field.writable.then_some(FieldPair {
                    name: field.name,
                    source: index,
                    destination: target,
                    compatible: compatible(field, target_field),
                })
            })
            .collect();

        Self {
            source,
            destination,
            pairs,
        }
    }

    pub fn pairs(&self) -> &[FieldPair] {
        &self.pairs
    }

    pub fn source(&self) -> &Layout {
        &self.source
    }

    pub fn destination(&self) -> &Layout {
        &self.destination
    }

    fn source_field(&self, pair: &FieldPair) -> &FieldDescriptor {
        &self.source.fields()[pair.source]
    }

    fn destination_field(&self, pair: &FieldPair) -> &FieldDescriptor {
        &self.destination.fields()[pair.destination]
    }

    fn mismatch(&self, pair: &FieldPair, path: String) -> MapError {
        MapError::TypeMismatch {
            path,
            expected: describe(self.destination_field(pair)),
            found: describe(self.source_field(pair)),
        }
    }

    fn assign_error(&self, pair: &FieldPair, path: String, err: AssignError) -> MapError {
        match err {
            AssignError::Incompatible { .. } => self.mismatch(pair, path),
            AssignError::ReadOnly | AssignError::UnknownField(_) => {
                MapError::Assign { path, source: err }
            }
        }
    }
}

/// The automatic, name-matched part of a mapping.
///
/// Copy plans are computed once per shape pair and reused; the copier is
/// safe to share between threads.
#[derive(Debug, Default)]
pub struct StructuralCopier {
    options: MapperOptions,
    plans: RwLock<HashMap<(TypeId, TypeId), Arc<CopyPlan>>>,
}

impl StructuralCopier {
    pub fn new(options: MapperOptions) -> Self {
        Self {
            options,
            plans: RwLock::default(),
        }
    }

    pub fn options(&self) -> &MapperOptions {
        &self.options
    }

    /// Copies every matching field of `source` into `destination`.
    ///
    /// An absent operand makes the call a no-op. A type mismatch aborts the
    /// copy; fields written before it keep their new values.
    pub fn copy(
        &self,
        source: Option<&dyn Record>,
        destination: Option<&mut dyn Record>,
    ) -> Result<()> {
        let (Some(source), Some(destination)) = (source, destination) else {
            tracing::trace!("Null operand, nothing to copy");
            return Ok(());
        };
        self.copy_record(source, destination, "", 0)
    }

    /// Returns the cached plan for the shapes of `source` and `destination`.
    pub fn plan(&self, source: &dyn Record, destination: &dyn Record) -> Arc<CopyPlan> {
        let source = source.layout();
        let destination = destination.layout();
        let key = (source.shape().id(), destination.shape().id());

        if let Some(plan) = self
            .plans
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Arc::clone(plan);
        }

        let plan = Arc::new(CopyPlan::build(source, destination));
        tracing::debug!(
            source = %plan.source.shape(),
            destination = %plan.destination.shape(),
            pairs = plan.pairs.len(),
            "Built copy plan"
        );
        Arc::clone(
            self.plans
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(key)
                .or_insert(plan),
        )
    }

    fn copy_record(
        &self,
        source: &dyn Record,
        destination: &mut dyn Record,
        path: &str,
        depth: usize,
    ) -> Result<()> {
        if let Some(limit) = self.options.max_depth.filter(|&limit| depth > limit) {
            return Err(MapError::DepthLimitExceeded {
                path: path.to_string(),
                limit,
            });
        }

        let plan = self.plan(source, &*destination);
        for pair in plan.pairs() {
            let field_path = join_path(path, pair.name);
            let Some(value) = source.read_field(pair.source) else {
                continue;
            };

            // Absence carries no type, so it never mismatches.
            if value.is_absent() {
                if self.options.absent_values == AbsentValuePolicy::Skip {
                    tracing::trace!(field = %field_path, "Absent value skipped");
                    continue;
                }
                destination
                    .write_field(pair.destination, FieldValue::Absent)
                    .map_err(|err| plan.assign_error(pair, field_path, err))?;
                continue;
            }
            if !pair.compatible {
                return Err(plan.mismatch(pair, field_path));
            }

            match value {
                FieldValue::Record(nested) => {
                    let Some(nested_destination) = destination.record_field_mut(pair.destination)
                    else {
                        return Err(plan.mismatch(pair, field_path));
                    };
                    self.copy_record(nested, nested_destination, &field_path, depth + 1)?;
                }
                value => {
                    destination
                        .write_field(pair.destination, value)
                        .map_err(|err| plan.assign_error(pair, field_path.clone(), err))?;
                    tracing::trace!(field = %field_path, "Copied");
                }
            }
        }
        Ok(())
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

/// Records recurse into any record; values and sequences need the same
/// declared value or element type.
fn compatible(source: &FieldDescriptor, destination: &FieldDescriptor) -> bool {
    match (source.kind, destination.kind) {
        (FieldKind::Record, FieldKind::Record) => true,
        (from, to) => from == to && source.value_type == destination.value_type,
    }
}

fn describe(field: &FieldDescriptor) -> String {
    match field.kind {
        FieldKind::Sequence => format!("sequence of {}", field.value_type),
        FieldKind::Value | FieldKind::Record => field.value_type.name().to_string(),
    }
}
