//! Routine declarations and the invocable surface.
//!
//! Routines are owned by the external registry collaborator; this module
//! defines what the pipeline needs from them: an explicit declaration struct
//! built by registration functions (no implicit metadata injection), and the
//! invocation trait whose output may be an eager list or a lazy stream.

use crate::aspects::AspectOverride;
use crate::config::InvocationArguments;
use crate::domain::errors::RoutineFailure;
use crate::settings::SettingValue;

/// Execution kind of a routine, used to word failure diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineKind {
    /// Runs once per target file.
    FileScoped,
    /// Runs once for the whole analysis run.
    WholeRun,
}

/// Declared type tag of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Bool,
    Int,
    Float,
    Str,
}

/// One declared parameter of a routine.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    name: String,
    default: Option<SettingValue>,
    type_tag: Option<TypeTag>,
}

impl ParamSpec {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn default(&self) -> Option<&SettingValue> {
        self.default.as_ref()
    }

    #[must_use]
    pub fn type_tag(&self) -> Option<TypeTag> {
        self.type_tag
    }

    /// A parameter without a declared default must be resolved before
    /// invocation.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }
}

/// Explicit declaration of a routine: name, kind, ordered parameters, and
/// the aspect override mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutineSpec {
    name: String,
    kind: RoutineKind,
    params: Vec<ParamSpec>,
    aspect_overrides: Vec<(String, AspectOverride)>,
    wraps_tool: bool,
}

impl RoutineSpec {
    pub fn new(name: impl Into<String>, kind: RoutineKind) -> Self {
        Self {
            name: name.into(),
            kind,
            params: Vec::new(),
            aspect_overrides: Vec::new(),
            wraps_tool: false,
        }
    }

    /// Declare a non-optional parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, type_tag: Option<TypeTag>) -> Self {
        self.params.push(ParamSpec { name: name.into(), default: None, type_tag });
        self
    }

    /// Declare an optional parameter with its default.
    #[must_use]
    pub fn with_optional_param(
        mut self,
        name: impl Into<String>,
        default: impl Into<SettingValue>,
        type_tag: Option<TypeTag>,
    ) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            default: Some(default.into()),
            type_tag,
        });
        self
    }

    /// Map a declared parameter to an aspect-derived default.
    #[must_use]
    pub fn with_aspect_override(
        mut self,
        parameter: impl Into<String>,
        value: AspectOverride,
    ) -> Self {
        self.aspect_overrides.push((parameter.into(), value));
        self
    }

    /// Mark the routine as driving an external tool. Profiler tables for
    /// such routines are filtered to rows mentioning the routine or the
    /// tool label.
    #[must_use]
    pub fn wrapping_tool(mut self) -> Self {
        self.wraps_tool = true;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> RoutineKind {
        self.kind
    }

    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    #[must_use]
    pub fn aspect_overrides(&self) -> &[(String, AspectOverride)] {
        &self.aspect_overrides
    }

    #[must_use]
    pub fn wraps_tool(&self) -> bool {
        self.wraps_tool
    }
}

/// Opaque value produced by a routine. Collected and relayed, never
/// inspected or mutated.
pub type ResultItem = serde_json::Value;

/// A lazily produced sequence of result items; production may fail
/// mid-stream.
pub type ResultStream = Box<dyn Iterator<Item = Result<ResultItem, RoutineFailure>>>;

/// Raw output of one invocation.
pub enum RoutineOutput {
    Eager(Vec<ResultItem>),
    Lazy(ResultStream),
}

impl std::fmt::Debug for RoutineOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutineOutput::Eager(items) => f.debug_tuple("Eager").field(items).finish(),
            RoutineOutput::Lazy(_) => f.debug_tuple("Lazy").field(&"..").finish(),
        }
    }
}

impl RoutineOutput {
    pub fn lazy<I>(stream: I) -> Self
    where
        I: Iterator<Item = Result<ResultItem, RoutineFailure>> + 'static,
    {
        RoutineOutput::Lazy(Box::new(stream))
    }
}

/// The invocable unit of work.
pub trait Routine {
    fn spec(&self) -> &RoutineSpec;

    fn run(&self, args: &InvocationArguments) -> Result<RoutineOutput, RoutineFailure>;
}

/// Closure-backed routine for demos and tests.
pub struct FnRoutine<F> {
    spec: RoutineSpec,
    body: F,
}

impl<F> FnRoutine<F>
where
    F: Fn(&InvocationArguments) -> Result<RoutineOutput, RoutineFailure>,
{
    pub fn new(spec: RoutineSpec, body: F) -> Self {
        Self { spec, body }
    }
}

impl<F> Routine for FnRoutine<F>
where
    F: Fn(&InvocationArguments) -> Result<RoutineOutput, RoutineFailure>,
{
    fn spec(&self) -> &RoutineSpec {
        &self.spec
    }

    fn run(&self, args: &InvocationArguments) -> Result<RoutineOutput, RoutineFailure> {
        (self.body)(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_spec_declaration_order_is_kept() {
        let spec = RoutineSpec::new("TestOne", RoutineKind::FileScoped)
            .with_param("x", Some(TypeTag::Int))
            .with_param("y", Some(TypeTag::Str))
            .with_optional_param("z", 79i64, Some(TypeTag::Int))
            .with_optional_param("w", "kbc", Some(TypeTag::Str));

        let names: Vec<&str> = spec.params().iter().map(ParamSpec::name).collect();
        assert_eq!(names, ["x", "y", "z", "w"]);
        assert!(!spec.params()[0].is_optional());
        assert!(spec.params()[2].is_optional());
    }

    #[test]
    fn test_fn_routine_runs_body() {
        let spec = RoutineSpec::new("Inline", RoutineKind::WholeRun);
        let routine = FnRoutine::new(spec, |_args| Ok(RoutineOutput::Eager(vec![json!(1)])));

        let output = routine.run(&InvocationArguments::new()).unwrap();
        match output {
            RoutineOutput::Eager(items) => assert_eq!(items, vec![json!(1)]),
            RoutineOutput::Lazy(_) => panic!("expected eager output"),
        }
    }
}
