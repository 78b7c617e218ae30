//! Skeleton of a CRAB task configuration.
//!
//! A task configuration is an ordered set of named sections, each holding
//! free-form parameters. [`crab_config`] returns one with every section CRAB
//! recognises already created, ready to be filled in.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::errors::ClientError;

/// Sections CRAB recognises, in their conventional order.
pub const CRAB_SECTIONS: [&str; 6] = ["General", "JobType", "Data", "Site", "User", "Debug"];

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    name: String,
    params: BTreeMap<String, Value>,
}

impl Section {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            params: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.params.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    pub fn params(&self) -> &BTreeMap<String, Value> {
        &self.params
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskConfig {
    sections: Vec<Section>,
}

impl TaskConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the named section, creating it at the end if it is new.
    pub fn add_section(&mut self, name: &str) -> &mut Section {
        let idx = match self.sections.iter().position(|s| s.name == name) {
            Some(idx) => idx,
            None => {
                self.sections.push(Section::new(name));
                self.sections.len() - 1
            }
        };
        &mut self.sections[idx]
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn section_names(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.name.as_str()).collect()
    }

    /// Set `section.key`; the section must already exist.
    pub fn set(
        &mut self,
        section: &str,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<(), ClientError> {
        match self.sections.iter_mut().find(|s| s.name == section) {
            Some(s) => {
                s.set(key, value);
                Ok(())
            }
            None => Err(ClientError::Client(format!(
                "Configuration has no section '{}'",
                section
            ))),
        }
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&Value> {
        self.section(section).and_then(|s| s.get(key))
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

impl Serialize for TaskConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len()))?;
        for section in &self.sections {
            map.serialize_entry(&section.name, &section.params)?;
        }
        map.end()
    }
}

/// A configuration holding every section CRAB recognises, all empty.
pub fn crab_config() -> TaskConfig {
    let mut config = TaskConfig::new();
    for name in CRAB_SECTIONS {
        config.add_section(name);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_crab_config_sections_in_order() {
        let config = crab_config();
        assert_eq!(
            config.section_names(),
            vec!["General", "JobType", "Data", "Site", "User", "Debug"]
        );
        assert!(config.section("Data").unwrap().params().is_empty());
    }

    #[test]
    fn test_section_is_idempotent() {
        let mut config = crab_config();
        config.add_section("Data").set("inputDataset", "/A/B/C");
        config.add_section("Data");
        assert_eq!(config.section_names().len(), 6);
        assert_eq!(config.get("Data", "inputDataset"), Some(&json!("/A/B/C")));
    }

    #[test]
    fn test_set_requires_existing_section() {
        let mut config = crab_config();
        config.set("Site", "storageSite", "T2_CH_CERN").unwrap();
        assert_eq!(config.get("Site", "storageSite"), Some(&json!("T2_CH_CERN")));

        let err = config.set("Nope", "x", 1).unwrap_err();
        assert!(err.to_string().contains("no section 'Nope'"));
    }

    #[test]
    fn test_to_yaml_keeps_section_order() {
        let mut config = crab_config();
        config.set("General", "requestName", "my_task").unwrap();
        config.set("JobType", "maxMemoryMB", 2500).unwrap();

        let yaml = config.to_yaml().unwrap();
        let general = yaml.find("General:").unwrap();
        let job_type = yaml.find("JobType:").unwrap();
        let debug = yaml.find("Debug:").unwrap();
        assert!(general < job_type && job_type < debug);
        assert!(yaml.contains("requestName: my_task"));
        assert!(yaml.contains("maxMemoryMB: 2500"));
    }
}
