//! Serializable snapshot of override usage counters.

use serde::{Deserialize, Serialize};

/// Usage of a single override entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideUsage {
    /// Source shape the override was registered for.
    pub source: String,
    /// Destination shape the override was registered for.
    pub destination: String,
    /// Successful invocations.
    pub usage_count: u64,
}

/// Usage of every entry in one configuration, in registration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationUsage {
    pub name: String,
    pub overrides: Vec<OverrideUsage>,
}

/// Usage counters of a whole registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageReport {
    pub configurations: Vec<ConfigurationUsage>,
}

impl UsageReport {
    pub fn configuration(&self, name: &str) -> Option<&ConfigurationUsage> {
        self.configurations.iter().find(|usage| usage.name == name)
    }

    /// Sum of all usage counters.
    pub fn total_invocations(&self) -> u64 {
        self.configurations
            .iter()
            .flat_map(|usage| &usage.overrides)
            .map(|entry| entry.usage_count)
            .sum()
    }

    /// Entries that never ran.
    pub fn unused(&self) -> impl Iterator<Item = (&str, &OverrideUsage)> + '_ {
        self.configurations.iter().flat_map(|usage| {
            usage
                .overrides
                .iter()
                .filter(|entry| entry.usage_count == 0)
                .map(move |entry| (usage.name.as_str(), entry))
        })
    }
}
