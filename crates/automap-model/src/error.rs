use thiserror::Error;

/// Failure to store a value into a destination field.
///
/// Raised by the field mutators; the engine wraps it with the field path
/// and the source type before handing it to the caller.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AssignError {
    /// The incoming value does not have the field's declared type.
    #[error("expected a value of type {expected}")]
    Incompatible { expected: &'static str },
    /// The field has no mutator (computed fields).
    #[error("field is read-only")]
    ReadOnly,
    /// The field index is outside the shape's layout.
    #[error("no field at index {0}")]
    UnknownField(usize),
}

impl AssignError {
    pub(crate) fn incompatible<V: ?Sized + 'static>() -> Self {
        Self::Incompatible {
            expected: std::any::type_name::<V>(),
        }
    }
}
