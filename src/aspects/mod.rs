//! Activated aspects and their taste tables.
//!
//! An aspect is a named capability bundle that can be activated for a run.
//! Activated aspects contribute default parameter values to routines that
//! declare an override mapping: either a boolean presence flag, or a typed
//! "taste" value drawn from the aspect's taste table.

use crate::settings::SettingValue;
use std::collections::BTreeMap;

/// A layered default for one routine parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AspectOverride {
    /// Parameter becomes `true` iff the named capability is active.
    Flag(String),
    /// Parameter takes the resolved taste value of an active aspect.
    Taste { aspect: String, taste: String },
}

impl AspectOverride {
    pub fn taste(aspect: impl Into<String>, taste: impl Into<String>) -> Self {
        AspectOverride::Taste { aspect: aspect.into(), taste: taste.into() }
    }
}

/// One activated aspect with its resolved taste values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AspectInstance {
    name: String,
    tastes: BTreeMap<String, SettingValue>,
}

impl AspectInstance {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), tastes: BTreeMap::new() }
    }

    #[must_use]
    pub fn with_taste(mut self, name: impl Into<String>, value: impl Into<SettingValue>) -> Self {
        self.tastes.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn taste(&self, name: &str) -> Option<&SettingValue> {
        self.tastes.get(name)
    }
}

/// The collection of aspects activated for the current run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveAspects {
    instances: Vec<AspectInstance>,
}

impl ActiveAspects {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activate(&mut self, instance: AspectInstance) -> &mut Self {
        self.instances.push(instance);
        self
    }

    /// Presence test for a capability reference.
    #[must_use]
    pub fn is_active(&self, capability: &str) -> bool {
        self.get(capability).is_some()
    }

    /// Lookup by aspect name.
    #[must_use]
    pub fn get(&self, aspect: &str) -> Option<&AspectInstance> {
        self.instances.iter().find(|instance| instance.name == aspect)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_presence() {
        let mut aspects = ActiveAspects::new();
        aspects.activate(AspectInstance::new("Redundancy"));

        assert!(aspects.is_active("Redundancy"));
        assert!(!aspects.is_active("Spelling"));
    }

    #[test]
    fn test_taste_lookup() {
        let mut aspects = ActiveAspects::new();
        aspects.activate(
            AspectInstance::new("LineLength").with_taste("max_line_length", 100i64),
        );

        let instance = aspects.get("LineLength").unwrap();
        assert_eq!(instance.taste("max_line_length"), Some(&SettingValue::Int(100)));
        assert_eq!(instance.taste("tab_width"), None);
    }
}
