//! Configuration options for mapping calls.

use serde::{Deserialize, Serialize};

/// Default bound on nested record recursion.
///
/// Deeper graphs are rejected, not truncated.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// What the copier does when a source field holds no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbsentValuePolicy {
    /// Write the absence through: optional fields become `None`, plain
    /// fields are reset to their default.
    #[default]
    Propagate,
    /// Leave the destination field untouched.
    Skip,
}

/// Options controlling the structural copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperOptions {
    /// Handling of absent source values.
    pub absent_values: AbsentValuePolicy,

    /// Maximum nesting depth for record recursion.
    ///
    /// The top-level value is depth 0. With the default of
    /// [`DEFAULT_MAX_DEPTH`], a graph nested deeper than 64 records (for
    /// example a boxed linked list of 66 nodes) is rejected with a
    /// depth-limit error even though it is acyclic. `None` removes the
    /// bound; recursion then ends only when the object graph does, at the
    /// cost of stack depth.
    pub max_depth: Option<usize>,
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            absent_values: AbsentValuePolicy::Propagate,
            max_depth: Some(DEFAULT_MAX_DEPTH),
        }
    }
}

impl MapperOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_absent_values(mut self, policy: AbsentValuePolicy) -> Self {
        self.absent_values = policy;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_propagate_with_bounded_depth() {
        let options = MapperOptions::default();
        assert_eq!(options.absent_values, AbsentValuePolicy::Propagate);
        assert_eq!(options.max_depth, Some(DEFAULT_MAX_DEPTH));
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let options: MapperOptions =
            serde_json::from_str(r#"{"absent_values": "skip"}"#).expect("parse options");
        assert_eq!(options.absent_values, AbsentValuePolicy::Skip);
        assert_eq!(options.max_depth, Some(DEFAULT_MAX_DEPTH));

        let options: MapperOptions =
            serde_json::from_str(r#"{"max_depth": null}"#).expect("parse options");
        assert_eq!(options.max_depth, None);
    }

    #[test]
    fn options_serialize() {
        let options = MapperOptions::new()
            .with_absent_values(AbsentValuePolicy::Skip)
            .with_max_depth(Some(3));
        let json = serde_json::to_string(&options).expect("serialize options");
        let round: MapperOptions = serde_json::from_str(&json).expect("deserialize options");
        assert_eq!(round, options);
    }
}
