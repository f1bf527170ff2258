//! Domain-level error taxonomy for CTM mind-map generation.

/// A single CTM grammar violation, tagged with the 1-based line it occurred on.
///
/// The `Display` text is the diagnostic that is fed back to the generator on
/// a retry, so it names the rule and carries enough detail to fix it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CtmError {
    #[error("Input is empty. Expected CTM format content.")]
    EmptyInput,

    #[error("Line {line}: Root node must not have any '>' prefix. Found {found} '>' character(s).")]
    RootNotLevelZero { line: usize, found: usize },

    #[error("Line {line}: Line starts with whitespace. Remove spaces/tabs before '>' markers.")]
    LeadingWhitespace { line: usize },

    #[error("Line {line}: Spaces found within '>' markers. Remove all spaces from indentation.")]
    WhitespaceInMarkers { line: usize },

    #[error("Line {line}: Space after '>' markers. Label should immediately follow '>' without spaces.")]
    WhitespaceAfterMarkers { line: usize },

    #[error("Line {line}: Node label is empty. Each node must have a label.")]
    EmptyLabel { line: usize },

    #[error(
        "Line {line}: Level skip detected! Jumped from level {previous} to level {current}. \
         You can only increment by 1 level at a time. Missing parent node at level {missing}."
    )]
    LevelSkip {
        line: usize,
        previous: usize,
        current: usize,
        missing: usize,
    },

    /// Never produced by the parser, whose marker run is `>` only.
    #[error("Line {line}: Invalid indentation characters. Only '>' is allowed for indentation.")]
    InvalidIndentation { line: usize },

    #[error("Line {line}: Attribute section is empty after '|'. Either remove '|' or add attributes.")]
    EmptyAttributes { line: usize },

    #[error("Line {line}: Invalid attribute format '{pair}'. Expected 'key:value' format.")]
    MalformedAttribute { line: usize, pair: String },

    #[error("Line {line}: Attribute key is empty in '{pair}'.")]
    EmptyAttributeKey { line: usize, pair: String },
}

impl CtmError {
    /// The 1-based line the violation was found on. `EmptyInput` has none.
    pub fn line(&self) -> Option<usize> {
        match self {
            CtmError::EmptyInput => None,
            CtmError::RootNotLevelZero { line, .. }
            | CtmError::LeadingWhitespace { line }
            | CtmError::WhitespaceInMarkers { line }
            | CtmError::WhitespaceAfterMarkers { line }
            | CtmError::EmptyLabel { line }
            | CtmError::LevelSkip { line, .. }
            | CtmError::InvalidIndentation { line }
            | CtmError::EmptyAttributes { line }
            | CtmError::MalformedAttribute { line, .. }
            | CtmError::EmptyAttributeKey { line, .. } => Some(*line),
        }
    }
}

/// Failures raised by a generation backend while producing a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("provider error: {0}")]
    Provider(String),

    #[error("transport error: {0}")]
    Http(String),

    #[error("generator returned an empty response")]
    EmptyResponse,

    #[error("generator misconfigured: {0}")]
    Configuration(String),
}

/// Errors produced while loading settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Umbrella error for mind-map operations.
#[derive(Debug, thiserror::Error)]
pub enum MindmapError {
    #[error("invalid CTM: {0}")]
    Ctm(#[from] CtmError),

    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for mind-map domain operations.
pub type Result<T> = std::result::Result<T, MindmapError>;
