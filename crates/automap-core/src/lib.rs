//! Object-to-object mapping engine.
//!
//! A mapping call copies every same-named, compatible field from a source
//! shape to a destination shape and then runs the override functions of a
//! named configuration, in the order they were registered.
//!
//! # Example
//!
//! ```ignore
//! use automap_core::{Mapper, MappingRegistry, MappingService};
//!
//! let registry = MappingRegistry::new()
//!     .register("Default", |src: &Customer, dst: &mut CustomerDto| {
//!         dst.name = src.name.to_uppercase();
//!     });
//!
//! let service = MappingService::from(Mapper::new(registry));
//! let dto: CustomerDto = service.map(Some(&customer))?;
//! ```

#![deny(unsafe_code)]

pub mod copier;
pub mod error;
pub mod mapper;
pub mod registry;
pub mod report;
pub mod service;

pub use copier::{CopyPlan, FieldPair, StructuralCopier};
pub use error::{MapError, Result};
pub use mapper::Mapper;
pub use registry::{DEFAULT_CONFIG, MappingRegistry, OverrideEntry};
pub use report::{ConfigurationUsage, OverrideUsage, UsageReport};
pub use service::MappingService;

pub use automap_model::{
    AbsentValuePolicy, FieldKind, Layout, MapperOptions, Record, Sequence, Shape, ShapeBuilder,
    TypeInfo, layout_of,
};
