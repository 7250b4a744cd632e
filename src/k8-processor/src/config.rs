use indexmap::IndexMap;
use indexmap::IndexSet;
use serde::Deserialize;
use serde::Serialize;

use crate::ProcessorError;

/// Contract for pluggable processors (enrichers, generators, watchers).
/// The pipeline only requires a name unique within a category.
pub trait Named {
    fn name(&self) -> &str;
}

/// Per unit configuration, key to value in declaration order
pub type UnitConfig = IndexMap<String, String>;

/// Configuration for a category of processors: which units run, in
/// which order and with which per unit settings.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Units to include. `None` means no include filter, an empty
    /// list selects nothing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub includes: Option<Vec<String>>,
    /// Units to exclude. Only consulted when no includes are given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excludes: Option<IndexSet<String>>,
    /// Unit name to key/value settings
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub config: IndexMap<String, UnitConfig>,
}

impl ProcessorConfig {
    pub fn new(
        includes: Option<Vec<String>>,
        excludes: Option<IndexSet<String>>,
        config: IndexMap<String, UnitConfig>,
    ) -> Self {
        Self {
            includes,
            excludes,
            config,
        }
    }

    /// Look up a single configuration value for a unit. An unknown
    /// unit or key is `None`, callers fall back to their own default.
    pub fn get_config(&self, name: &str, key: &str) -> Option<&str> {
        self.config
            .get(name)
            .and_then(|unit| unit.get(key))
            .map(String::as_str)
    }

    /// Check whether the unit with this name is selected by the
    /// include and exclude filters. Includes take precedence over
    /// excludes: when an include list is present it alone decides.
    pub fn uses(&self, name: &str) -> bool {
        if let Some(includes) = &self.includes {
            includes.iter().any(|inc| inc == name)
        } else if let Some(excludes) = &self.excludes {
            !excludes.contains(name)
        } else {
            true
        }
    }

    /// Filter and order the discovered units.
    ///
    /// With an include list the result is exactly the listed units in
    /// list order, and a name without a matching unit is an error
    /// carrying the `role` ("generator", "enricher", ...) so the
    /// operator can locate the offending configuration. Without an
    /// include list the discovery order is kept and excluded names are
    /// dropped. A duplicate name among the discovered units is an
    /// error as well.
    pub fn prepare_processors<'a, T: Named>(
        &self,
        units: &'a [T],
        role: &str,
    ) -> Result<Vec<&'a T>, ProcessorError> {
        let mut lookup: IndexMap<&str, &T> = IndexMap::with_capacity(units.len());
        for unit in units {
            if lookup.insert(unit.name(), unit).is_some() {
                return Err(ProcessorError::DuplicateName {
                    role: role.to_owned(),
                    name: unit.name().to_owned(),
                });
            }
        }

        if let Some(includes) = &self.includes {
            let mut ret = Vec::with_capacity(includes.len());
            for name in includes {
                match lookup.get(name.as_str()) {
                    Some(unit) => ret.push(*unit),
                    None => {
                        return Err(ProcessorError::MissingInclude {
                            role: role.to_owned(),
                            name: name.clone(),
                        })
                    }
                }
            }
            Ok(ret)
        } else {
            Ok(units
                .iter()
                .filter(|unit| {
                    self.excludes
                        .as_ref()
                        .map_or(true, |excludes| !excludes.contains(unit.name()))
                })
                .collect())
        }
    }

    /// Merge configurations left to right. A later source's include
    /// and exclude filters replace the earlier ones wholesale (no
    /// concatenation, no set union), nested config maps are merged per
    /// unit and per key with the later value winning.
    pub fn merge<'a, I>(configs: I) -> ProcessorConfig
    where
        I: IntoIterator<Item = &'a ProcessorConfig>,
    {
        let mut ret = ProcessorConfig::default();
        for config in configs {
            ret.merge_from(config);
        }
        ret
    }

    fn merge_from(&mut self, overriding: &ProcessorConfig) {
        if overriding.includes.is_some() {
            self.includes = overriding.includes.clone();
        }
        if overriding.excludes.is_some() {
            self.excludes = overriding.excludes.clone();
        }
        for (unit, values) in &overriding.config {
            let merged = self.config.entry(unit.clone()).or_default();
            for (key, value) in values {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod test {

    use indexmap::IndexMap;
    use indexmap::IndexSet;

    use super::Named;
    use super::ProcessorConfig;
    use super::UnitConfig;
    use crate::ProcessorError;

    struct TestUnit {
        name: String,
    }

    impl TestUnit {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_owned(),
            }
        }
    }

    impl Named for TestUnit {
        fn name(&self) -> &str {
            &self.name
        }
    }

    fn units(names: &[&str]) -> Vec<TestUnit> {
        names.iter().map(|name| TestUnit::new(name)).collect()
    }

    fn names(prepared: &[&TestUnit]) -> Vec<String> {
        prepared.iter().map(|unit| unit.name.clone()).collect()
    }

    fn includes() -> Option<Vec<String>> {
        Some(vec!["i1".to_owned(), "i2".to_owned(), "i3".to_owned()])
    }

    fn excludes() -> Option<IndexSet<String>> {
        Some(IndexSet::from(["e1".to_owned()]))
    }

    fn unit_config() -> IndexMap<String, UnitConfig> {
        IndexMap::from([(
            "k1".to_owned(),
            UnitConfig::from([("i1".to_owned(), "v1".to_owned())]),
        )])
    }

    #[test]
    fn test_uses_includes_and_excludes() {
        let config = ProcessorConfig::new(includes(), excludes(), unit_config());
        assert!(config.uses("i2"));
        assert!(!config.uses("e1"));
        assert!(!config.uses("n1"));
    }

    #[test]
    fn test_uses_includes_only() {
        let config = ProcessorConfig::new(includes(), None, unit_config());
        assert!(config.uses("i2"));
        assert!(!config.uses("e1"));
        assert!(!config.uses("n1"));
    }

    #[test]
    fn test_uses_excludes_only() {
        let config = ProcessorConfig::new(None, excludes(), unit_config());
        assert!(config.uses("i2"));
        assert!(!config.uses("e1"));
        assert!(config.uses("n1"));
    }

    #[test]
    fn test_uses_no_filters() {
        let config = ProcessorConfig::new(None, None, unit_config());
        assert!(config.uses("i2"));
        assert!(config.uses("e1"));
        assert!(config.uses("n1"));
    }

    #[test]
    fn test_empty_includes_select_nothing() {
        let config = ProcessorConfig::new(Some(vec![]), None, unit_config());
        assert!(!config.uses("i2"));
        assert!(!config.uses("e1"));
        assert!(!config.uses("n1"));

        let discovered = units(&["i1", "i2", "e1"]);
        let prepared = config
            .prepare_processors(&discovered, "generator")
            .expect("prepare");
        assert!(prepared.is_empty());
    }

    #[test]
    fn test_config_lookup() {
        let config = ProcessorConfig::new(None, None, unit_config());
        assert_eq!(config.get_config("k1", "i1"), Some("v1"));
        assert_eq!(config.get_config("k2", "i1"), None);
        assert_eq!(config.get_config("k1", "i2"), None);
    }

    #[test]
    fn test_include_order_wins() {
        let discovered = units(&["t1", "t2", "t3", "t4"]);
        let config = ProcessorConfig::new(
            Some(vec!["t4".to_owned(), "t2".to_owned()]),
            None,
            IndexMap::new(),
        );
        let prepared = config
            .prepare_processors(&discovered, "test")
            .expect("prepare");
        assert_eq!(names(&prepared), vec!["t4", "t2"]);
    }

    #[test]
    fn test_includes_override_excludes() {
        let discovered = units(&["i1", "i2", "i3", "e1"]);
        let config = ProcessorConfig::new(
            Some(vec!["e1".to_owned(), "i1".to_owned()]),
            excludes(),
            IndexMap::new(),
        );
        let prepared = config
            .prepare_processors(&discovered, "enricher")
            .expect("prepare");
        assert_eq!(names(&prepared), vec!["e1", "i1"]);
    }

    #[test]
    fn test_missing_include_names_role() {
        let discovered = units(&["t1"]);
        let config = ProcessorConfig::new(
            Some(vec!["t3".to_owned(), "t1".to_owned()]),
            None,
            IndexMap::new(),
        );
        match config.prepare_processors(&discovered, "bla") {
            Err(ProcessorError::MissingInclude { role, name }) => {
                assert_eq!(role, "bla");
                assert_eq!(name, "t3");
            }
            other => panic!("expected missing include, got {:?}", other.map(|p| names(&p))),
        }
    }

    #[test]
    fn test_exclude_only_keeps_discovery_order() {
        let discovered = units(&["i2", "i1", "i3", "e1"]);
        let config = ProcessorConfig::new(None, excludes(), IndexMap::new());
        let prepared = config
            .prepare_processors(&discovered, "generator")
            .expect("prepare");
        assert_eq!(names(&prepared), vec!["i2", "i1", "i3"]);
    }

    #[test]
    fn test_duplicate_names_detected() {
        let discovered = units(&["t1", "t2", "t1"]);
        let config = ProcessorConfig::default();
        match config.prepare_processors(&discovered, "watcher") {
            Err(ProcessorError::DuplicateName { role, name }) => {
                assert_eq!(role, "watcher");
                assert_eq!(name, "t1");
            }
            other => panic!("expected duplicate error, got {:?}", other.map(|p| names(&p))),
        }
    }

    #[test]
    fn test_merge_with_itself_is_identity() {
        let config = ProcessorConfig::new(includes(), excludes(), unit_config());
        let merged = ProcessorConfig::merge([&config, &config]);
        assert_eq!(merged, config);
    }

    #[test]
    fn test_merge_overrides_per_key() {
        let base = ProcessorConfig::new(
            None,
            None,
            IndexMap::from([(
                "unit".to_owned(),
                UnitConfig::from([
                    ("mode".to_owned(), "lenient".to_owned()),
                    ("port".to_owned(), "8080".to_owned()),
                ]),
            )]),
        );
        let overriding = ProcessorConfig::new(
            None,
            None,
            IndexMap::from([(
                "unit".to_owned(),
                UnitConfig::from([("mode".to_owned(), "strict".to_owned())]),
            )]),
        );

        let merged = ProcessorConfig::merge([&base, &overriding]);
        assert_eq!(merged.get_config("unit", "mode"), Some("strict"));
        assert_eq!(merged.get_config("unit", "port"), Some("8080"));
    }

    #[test]
    fn test_merge_later_includes_replace() {
        let base = ProcessorConfig::new(Some(vec!["a".to_owned()]), None, IndexMap::new());
        let overriding =
            ProcessorConfig::new(Some(vec!["b".to_owned(), "c".to_owned()]), None, IndexMap::new());

        let merged = ProcessorConfig::merge([&base, &overriding]);
        assert_eq!(
            merged.includes,
            Some(vec!["b".to_owned(), "c".to_owned()])
        );

        // a later source without includes keeps the earlier list
        let merged = ProcessorConfig::merge([&overriding, &ProcessorConfig::default()]);
        assert_eq!(
            merged.includes,
            Some(vec!["b".to_owned(), "c".to_owned()])
        );
    }
}
