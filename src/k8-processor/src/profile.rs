use std::cmp::Ordering;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering as AtomicOrdering;

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;

use crate::ProcessorConfig;
use crate::ProcessorError;

// Profiles read later sort after profiles read earlier when their
// order value ties
static DISCOVERY_SEQ: AtomicU64 = AtomicU64::new(0);

fn next_seq() -> u64 {
    DISCOVERY_SEQ.fetch_add(1, AtomicOrdering::Relaxed)
}

/// A named bundle of processor configurations, one per category
/// ("generator", "enricher", "watcher", ...). Profiles of the same
/// name can be merged into a single effective profile, profiles of
/// different names sort deterministically for layered application.
#[derive(Debug, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    /// When several profiles with the same name are found, the one
    /// with the higher order overrides the others.
    #[serde(default)]
    pub order: i32,
    #[serde(flatten)]
    configs: IndexMap<String, ProcessorConfig>,
    #[serde(skip_serializing, skip_deserializing, default = "next_seq")]
    seq: u64,
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: 0,
            configs: IndexMap::new(),
            seq: next_seq(),
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_config(mut self, category: impl Into<String>, config: ProcessorConfig) -> Self {
        self.configs.insert(category.into(), config);
        self
    }

    pub fn config(&self, category: &str) -> Option<&ProcessorConfig> {
        self.configs.get(category)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.configs.keys().map(String::as_str)
    }

    /// Merge two profiles of the same name. The profile with the
    /// higher order overrides, on a tie the second argument does.
    /// Differing names are a configuration error naming both sides.
    pub fn merge(one: &Profile, two: &Profile) -> Result<Profile, ProcessorError> {
        if one.name != two.name {
            return Err(ProcessorError::ProfileNameMismatch {
                first: one.name.clone(),
                second: two.name.clone(),
            });
        }

        let (base, overriding) = if one.order > two.order {
            (two, one)
        } else {
            (one, two)
        };

        let mut merged = Profile::new(one.name.as_str()).with_order(overriding.order);
        for (category, config) in &base.configs {
            merged.configs.insert(category.clone(), config.clone());
        }
        for (category, config) in &overriding.configs {
            let entry = merged.configs.entry(category.clone()).or_default();
            let combined = ProcessorConfig::merge([&*entry, config]);
            *entry = combined;
        }
        Ok(merged)
    }
}

// A copy is a new discovery, so it stays distinguishable in sorts
impl Clone for Profile {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            order: self.order,
            configs: self.configs.clone(),
            seq: next_seq(),
        }
    }
}

impl PartialEq for Profile {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for Profile {}

impl PartialOrd for Profile {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Profile {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order
            .cmp(&other.order)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}
