//! Execution modes for the parallel analysis harness.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Which analysis pipeline(s) a parallel request runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Only the original pipeline.
    Original,
    /// Only the enhanced pipeline.
    Mcp,
    /// Both pipelines concurrently, followed by a diff.
    #[default]
    Parallel,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Mcp => "mcp",
            Self::Parallel => "parallel",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "original" => Ok(Self::Original),
            "mcp" => Ok(Self::Mcp),
            "parallel" => Ok(Self::Parallel),
            other => Err(CoreError::Validation(format!(
                "unknown mode '{other}', expected one of: original, mcp, parallel"
            ))),
        }
    }

    pub fn runs_original(&self) -> bool {
        matches!(self, Self::Original | Self::Parallel)
    }

    pub fn runs_mcp(&self) -> bool {
        matches!(self, Self::Mcp | Self::Parallel)
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_parallel() {
        assert_eq!(ExecutionMode::default(), ExecutionMode::Parallel);
    }

    #[test]
    fn branch_selection() {
        assert!(ExecutionMode::Original.runs_original());
        assert!(!ExecutionMode::Original.runs_mcp());
        assert!(!ExecutionMode::Mcp.runs_original());
        assert!(ExecutionMode::Parallel.runs_original() && ExecutionMode::Parallel.runs_mcp());
    }

    #[test]
    fn parse_rejects_unknown_mode() {
        assert_eq!(ExecutionMode::parse("mcp").unwrap(), ExecutionMode::Mcp);
        assert!(ExecutionMode::parse("both").is_err());
    }
}
