//! Cloneable front door over a shared [`Mapper`].

use std::sync::Arc;

use automap_model::Shape;

use crate::error::Result;
use crate::mapper::Mapper;
use crate::registry::DEFAULT_CONFIG;

/// Thin facade for application code.
///
/// Clones share the same mapper, registry and usage counters.
#[derive(Debug, Clone)]
pub struct MappingService {
    mapper: Arc<Mapper>,
}

impl MappingService {
    pub fn new(mapper: impl Into<Arc<Mapper>>) -> Self {
        Self {
            mapper: mapper.into(),
        }
    }

    /// Maps with the default configuration.
    pub fn map<S: Shape, D: Shape>(&self, source: Option<&S>) -> Result<D> {
        self.mapper.map(source, DEFAULT_CONFIG)
    }

    /// Maps with a named configuration.
    pub fn map_with<S: Shape, D: Shape>(&self, source: Option<&S>, config: &str) -> Result<D> {
        self.mapper.map(source, config)
    }

    pub fn map_into<S: Shape, D: Shape>(
        &self,
        source: Option<&S>,
        destination: Option<&mut D>,
        config: &str,
    ) -> Result<()> {
        self.mapper.map_into(source, destination, config)
    }

    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }
}

impl From<Mapper> for MappingService {
    fn from(mapper: Mapper) -> Self {
        Self::new(mapper)
    }
}
