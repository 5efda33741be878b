//! Override resolution for routine invocations.
//!
//! Settings for one invocation come from several layers. Precedence, lowest
//! to highest: routine default < aspect default < explicit taste override <
//! explicit setting. An explicit setting suppresses aspect lookup for that
//! parameter entirely.

use crate::aspects::{ActiveAspects, AspectOverride};
use crate::domain::errors::ConfigError;
use crate::routine::RoutineSpec;
use crate::settings::{SettingValue, SettingsStore};
use std::collections::HashMap;

/// Final call arguments for one invocation, built fresh each time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvocationArguments {
    values: HashMap<String, SettingValue>,
}

impl InvocationArguments {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: SettingValue) {
        self.values.insert(name.into(), value);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SettingValue> {
        self.values.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Merges explicit settings with aspect/taste-derived defaults.
pub struct ConfigResolver<'a> {
    settings: &'a dyn SettingsStore,
    aspects: Option<&'a ActiveAspects>,
}

impl<'a> ConfigResolver<'a> {
    pub fn new(settings: &'a dyn SettingsStore, aspects: Option<&'a ActiveAspects>) -> Self {
        Self { settings, aspects }
    }

    /// Produce the final arguments for `spec`.
    ///
    /// # Errors
    /// `ConfigError::UnsetParameter` when a non-optional parameter remains
    /// unset after all layers were consulted. The caller recovers by
    /// skipping the invocation.
    pub fn resolve(&self, spec: &RoutineSpec) -> Result<InvocationArguments, ConfigError> {
        let mut args = InvocationArguments::new();

        // Explicit settings always win.
        for param in spec.params() {
            if let Some(value) = self.settings.get(param.name()) {
                args.set(param.name(), value);
            }
        }

        if let Some(aspects) = self.aspects.filter(|aspects| !aspects.is_empty()) {
            for (parameter, value) in spec.aspect_overrides() {
                if self.settings.contains(parameter) {
                    continue;
                }
                match value {
                    AspectOverride::Flag(capability) => {
                        args.set(parameter, SettingValue::Bool(aspects.is_active(capability)));
                    }
                    AspectOverride::Taste { aspect, taste } => {
                        if let Some(resolved) =
                            aspects.get(aspect).and_then(|instance| instance.taste(taste))
                        {
                            args.set(parameter, resolved.clone());
                        }
                    }
                }
            }
        }

        // Declared defaults fill whatever is still unset.
        for param in spec.params() {
            if args.contains(param.name()) {
                continue;
            }
            match param.default() {
                Some(default) => args.set(param.name(), default.clone()),
                None => {
                    return Err(ConfigError::UnsetParameter {
                        routine: spec.name().to_string(),
                        parameter: param.name().to_string(),
                    })
                }
            }
        }

        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aspects::AspectInstance;
    use crate::routine::{RoutineKind, TypeTag};
    use crate::settings::MapSettings;

    fn spec_with_aspects() -> RoutineSpec {
        RoutineSpec::new("LineLengthCheck", RoutineKind::FileScoped)
            .with_optional_param("max_line_length", 79i64, Some(TypeTag::Int))
            .with_optional_param("detect_redundancy", false, Some(TypeTag::Bool))
            .with_aspect_override(
                "max_line_length",
                AspectOverride::taste("LineLength", "max_line_length"),
            )
            .with_aspect_override(
                "detect_redundancy",
                AspectOverride::Flag("Redundancy".to_string()),
            )
    }

    #[test]
    fn test_explicit_setting_is_never_overridden() {
        let mut settings = MapSettings::new();
        settings.set("max_line_length", 120i64);

        let mut aspects = ActiveAspects::new();
        aspects.activate(AspectInstance::new("LineLength").with_taste("max_line_length", 100i64));

        let resolver = ConfigResolver::new(&settings, Some(&aspects));
        let args = resolver.resolve(&spec_with_aspects()).unwrap();

        assert_eq!(args.get("max_line_length"), Some(&SettingValue::Int(120)));
    }

    #[test]
    fn test_taste_beats_routine_default() {
        let settings = MapSettings::new();
        let mut aspects = ActiveAspects::new();
        aspects.activate(AspectInstance::new("LineLength").with_taste("max_line_length", 100i64));

        let resolver = ConfigResolver::new(&settings, Some(&aspects));
        let args = resolver.resolve(&spec_with_aspects()).unwrap();

        assert_eq!(args.get("max_line_length"), Some(&SettingValue::Int(100)));
    }

    #[test]
    fn test_capability_flag_reflects_activation() {
        let settings = MapSettings::new();

        let mut aspects = ActiveAspects::new();
        aspects.activate(AspectInstance::new("Redundancy"));
        let resolver = ConfigResolver::new(&settings, Some(&aspects));
        let args = resolver.resolve(&spec_with_aspects()).unwrap();
        assert_eq!(args.get("detect_redundancy"), Some(&SettingValue::Bool(true)));

        let mut other = ActiveAspects::new();
        other.activate(AspectInstance::new("Spelling"));
        let resolver = ConfigResolver::new(&settings, Some(&other));
        let args = resolver.resolve(&spec_with_aspects()).unwrap();
        assert_eq!(args.get("detect_redundancy"), Some(&SettingValue::Bool(false)));
    }

    #[test]
    fn test_no_aspects_is_a_passthrough() {
        let settings = MapSettings::new();
        let resolver = ConfigResolver::new(&settings, None);
        let args = resolver.resolve(&spec_with_aspects()).unwrap();

        // Declared defaults only.
        assert_eq!(args.get("max_line_length"), Some(&SettingValue::Int(79)));
        assert_eq!(args.get("detect_redundancy"), Some(&SettingValue::Bool(false)));
    }

    #[test]
    fn test_unset_non_optional_parameter_fails() {
        let spec = RoutineSpec::new("NeedsInput", RoutineKind::WholeRun)
            .with_param("x", Some(TypeTag::Int));
        let settings = MapSettings::new();
        let resolver = ConfigResolver::new(&settings, None);

        let err = resolver.resolve(&spec).unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnsetParameter {
                routine: "NeedsInput".to_string(),
                parameter: "x".to_string(),
            }
        );
    }
}
