//! Shape descriptions for the automap object mapper.
//!
//! Rust has no runtime reflection, so every mappable type describes itself
//! once through [`Shape::describe`]: a list of named fields with typed
//! accessor closures. The resulting table is cached per type and exposed to
//! the engine through the type-erased [`Record`] view.
//!
//! # Example
//!
//! ```
//! use automap_model::{Shape, ShapeBuilder, layout_of};
//!
//! #[derive(Default)]
//! struct Address {
//!     city: String,
//! }
//!
//! impl Shape for Address {
//!     fn describe(shape: &mut ShapeBuilder<Self>) {
//!         shape.value("city", |a| &a.city, |a| &mut a.city);
//!     }
//! }
//!
//! let layout = layout_of::<Address>();
//! assert_eq!(layout.fields()[0].name, "city");
//! ```

#![deny(unsafe_code)]

pub mod error;
pub mod options;
pub mod shape;
pub mod value;

pub use error::AssignError;
pub use options::{AbsentValuePolicy, DEFAULT_MAX_DEPTH, MapperOptions};
pub use shape::{
    FieldDescriptor, FieldKind, Layout, Record, Sequence, Shape, ShapeBuilder, TypeInfo, layout_of,
};
pub use value::{FieldValue, ValueRef};
