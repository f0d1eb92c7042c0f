//! Operation mode.
//!
//! Every tool this service currently ships is diagnostic-only, so the two
//! modes behave identically today; the flag exists so a future
//! write-capable tool (e.g. draining a node, resetting a GPU) has
//! somewhere to check before registering itself. See DESIGN.md.

use std::fmt;
use std::str::FromStr;

/// Whether mutating tools may register themselves against this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperationMode {
    /// Only diagnostic, non-mutating tools are available.
    #[default]
    ReadOnly,
    /// Mutating tools, if any are registered, are permitted to run.
    Operator,
}

impl OperationMode {
    /// Whether a tool marked as mutating is allowed to run under this mode.
    #[must_use]
    pub fn allows_mutation(self) -> bool {
        matches!(self, Self::Operator)
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ReadOnly => "read-only",
            Self::Operator => "operator",
        })
    }
}

/// Raised when a `--mode` value is neither `read-only` nor `operator`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid operation mode {0:?}, expected \"read-only\" or \"operator\"")]
pub struct ParseOperationModeError(String);

impl FromStr for OperationMode {
    type Err = ParseOperationModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read-only" => Ok(Self::ReadOnly),
            "operator" => Ok(Self::Operator),
            other => Err(ParseOperationModeError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_known_values() {
        assert_eq!("read-only".parse::<OperationMode>().unwrap(), OperationMode::ReadOnly);
        assert_eq!("operator".parse::<OperationMode>().unwrap(), OperationMode::Operator);
    }

    #[test]
    fn rejects_unknown_value() {
        assert!("admin".parse::<OperationMode>().is_err());
    }

    #[test]
    fn only_operator_mode_allows_mutation() {
        assert!(!OperationMode::ReadOnly.allows_mutation());
        assert!(OperationMode::Operator.allows_mutation());
    }

    #[test]
    fn default_is_read_only() {
        assert_eq!(OperationMode::default(), OperationMode::ReadOnly);
    }
}
