use std::fmt::Write as _;

use thiserror::Error;

/// Coarse classification of a [`ConfigError`], for callers that need to
/// react to the kind of failure rather than its details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The declared schema itself is malformed.
    Schema,
    /// A structurally required or metadata-required field was never provided.
    RequiredArgument,
    /// A value or type outside an enforced choice list was selected.
    InvalidChoice,
    /// Tokens were left over after the parse converged.
    UnknownArgument,
    /// A value could not be coerced, or a selected type is not acceptable.
    Type,
}

/// Nearest registered flags for one unrecognized argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub arg: String,
    pub alternatives: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Schema error in {context}: {reason}")]
    Schema { context: String, reason: String },

    #[error("The following arguments are required: {}", .flags.join(", "))]
    RequiredArgument { flags: Vec<String> },

    #[error("Invalid choice '{value}' for {flag} (choose from {})", .allowed.join(", "))]
    InvalidChoice {
        flag: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("{}", format_unknown(.args, .suggestions))]
    UnknownArgument {
        args: Vec<String>,
        suggestions: Vec<Suggestion>,
    },

    #[error("Invalid value for '{flag}': {reason}")]
    InvalidValue { flag: String, reason: String },

    #[error("Unknown type '{reference}' for '{flag}'")]
    UnknownType { flag: String, reference: String },

    #[error("Type '{selected}' selected for '{flag}' is not a subtype of '{expected}'")]
    SubtypeMismatch {
        flag: String,
        selected: String,
        expected: String,
    },

    #[error("Failed to materialize '{name}': {source}")]
    Materialize {
        name: String,
        source: serde_json::Error,
    },

    #[error("Failed to serialize default for root '{name}': {source}")]
    Serialize {
        name: String,
        source: serde_json::Error,
    },

    #[error("No root argument named '{0}'")]
    RootNotFound(String),
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::Schema { .. } | ConfigError::Serialize { .. } => ErrorKind::Schema,
            ConfigError::RequiredArgument { .. } => ErrorKind::RequiredArgument,
            ConfigError::InvalidChoice { .. } => ErrorKind::InvalidChoice,
            ConfigError::UnknownArgument { .. } => ErrorKind::UnknownArgument,
            ConfigError::InvalidValue { .. }
            | ConfigError::UnknownType { .. }
            | ConfigError::SubtypeMismatch { .. }
            | ConfigError::Materialize { .. }
            | ConfigError::RootNotFound(_) => ErrorKind::Type,
        }
    }

    pub(crate) fn schema(context: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Schema {
            context: context.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(flag: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            flag: format!("--{flag}"),
            reason: reason.into(),
        }
    }
}

fn format_unknown(args: &[String], suggestions: &[Suggestion]) -> String {
    let mut out = format!("Unrecognized arguments: {}", args.join(" "));
    for suggestion in suggestions {
        if suggestion.alternatives.is_empty() {
            let _ = write!(out, "\n  {}: No alternative available.", suggestion.arg);
        } else {
            let _ = write!(
                out,
                "\n  {}: Did you mean {}?",
                suggestion.arg,
                suggestion.alternatives.join(", ")
            );
        }
    }
    out
}
