//! Type-erased field values exchanged between accessors and the copier.

use std::any::Any;
use std::fmt;

use crate::shape::{FieldKind, Record};

/// A scalar read from a source field.
///
/// Stored fields are lent out; computed fields hand over an owned value.
pub enum ValueRef<'a> {
    Borrowed(&'a dyn Any),
    Owned(Box<dyn Any>),
}

impl ValueRef<'_> {
    pub fn as_any(&self) -> &dyn Any {
        match self {
            Self::Borrowed(value) => *value,
            Self::Owned(value) => &**value,
        }
    }
}

/// The current content of a field, as seen through a [`Record`].
pub enum FieldValue<'a> {
    /// The field holds no value (`None`).
    Absent,
    /// A string-like, primitive or other cloneable value.
    Value(ValueRef<'a>),
    /// The elements of an ordered collection, in iteration order.
    Sequence(Vec<&'a dyn Any>),
    /// A nested shape.
    Record(&'a dyn Record),
}

impl FieldValue<'_> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Category of the value, `None` when absent.
    pub fn kind(&self) -> Option<FieldKind> {
        match self {
            Self::Absent => None,
            Self::Value(_) => Some(FieldKind::Value),
            Self::Sequence(_) => Some(FieldKind::Sequence),
            Self::Record(_) => Some(FieldKind::Record),
        }
    }
}

impl fmt::Debug for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("Absent"),
            Self::Value(_) => f.write_str("Value(..)"),
            Self::Sequence(items) => write!(f, "Sequence(len={})", items.len()),
            Self::Record(record) => write!(f, "Record({})", record.layout().shape()),
        }
    }
}
