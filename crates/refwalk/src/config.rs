//! Configuration for dereference runs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::visitor::{ModelPropertyMacro, ParameterMacro};

/// Resolution mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Leave cycle markers in place; no allOf flattening
    Strict,

    /// Substitute placeholders for cycles and flatten `allOf`
    #[default]
    NonStrict,
}

impl Mode {
    /// Check if this is strict mode.
    pub fn is_strict(&self) -> bool {
        *self == Mode::Strict
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Strict => f.write_str("strict"),
            Mode::NonStrict => f.write_str("non-strict"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(Mode::Strict),
            "non-strict" => Ok(Mode::NonStrict),
            other => Err(format!("unknown mode '{}'", other)),
        }
    }
}

/// Options for one dereference run.
///
/// The serialisable subset can be loaded from JSON or YAML; macros are
/// attached in code.
///
/// # Example
///
/// ```
/// use refwalk::{DereferenceOptions, Mode};
///
/// let options = DereferenceOptions::from_yaml("mode: strict\nallowMetaPatches: true\n").unwrap();
/// assert_eq!(options.mode, Mode::Strict);
/// assert!(options.allow_meta_patches);
/// assert!(options.immutable);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DereferenceOptions {
    /// Merge a reference's sibling members into the resolved object
    pub allow_meta_patches: bool,

    /// Hook run on every operation parameter
    #[serde(skip)]
    pub parameter_macro: Option<ParameterMacro>,

    /// Hook run on every schema property
    #[serde(skip)]
    pub model_property_macro: Option<ModelPropertyMacro>,

    /// Strict or non-strict resolution
    pub mode: Mode,

    /// Resolve on a copy so a caller-supplied reference set is not mutated
    pub immutable: bool,

    /// Maximum tree depth before the run aborts
    pub max_depth: usize,

    /// Abort the run on the first macro error instead of recording it
    pub abort_on_macro_error: bool,
}

impl Default for DereferenceOptions {
    fn default() -> Self {
        Self {
            allow_meta_patches: false,
            parameter_macro: None,
            model_property_macro: None,
            mode: Mode::NonStrict,
            immutable: true,
            max_depth: 1000,
            abort_on_macro_error: false,
        }
    }
}

impl DereferenceOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict-mode options.
    pub fn strict() -> Self {
        Self {
            mode: Mode::Strict,
            ..Self::default()
        }
    }

    /// Load options from a JSON document.
    pub fn from_json(raw: &str) -> Result<Self, ParseError> {
        serde_json::from_str(raw)
            .map_err(|e| ParseError::new(format!("options: {}", e)).with_location(e.line(), e.column()))
    }

    /// Load options from a YAML document.
    pub fn from_yaml(raw: &str) -> Result<Self, ParseError> {
        serde_yaml::from_str(raw).map_err(|e| ParseError::new(format!("options: {}", e)))
    }

    /// Set whether reference siblings are merged.
    pub fn with_allow_meta_patches(mut self, allow: bool) -> Self {
        self.allow_meta_patches = allow;
        self
    }

    /// Set the parameter macro.
    pub fn with_parameter_macro(mut self, hook: ParameterMacro) -> Self {
        self.parameter_macro = Some(hook);
        self
    }

    /// Set the model property macro.
    pub fn with_model_property_macro(mut self, hook: ModelPropertyMacro) -> Self {
        self.model_property_macro = Some(hook);
        self
    }

    /// Set the resolution mode.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Set copy-on-resolve protection.
    pub fn with_immutable(mut self, immutable: bool) -> Self {
        self.immutable = immutable;
        self
    }

    /// Set the maximum tree depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set whether a macro error aborts the run.
    pub fn with_abort_on_macro_error(mut self, abort: bool) -> Self {
        self.abort_on_macro_error = abort;
        self
    }
}
