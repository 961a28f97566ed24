use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::{ContainerId, ItemId};

/// Machine-readable error codes for host and agent decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    BoardParseError,
    ContainerNotFound,
    ItemNotFound,
    DuplicateId,
    IndexOutOfRange,
    BoardFileWriteFailed,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::BoardParseError => "E1002",
            Self::ContainerNotFound => "E2001",
            Self::ItemNotFound => "E2002",
            Self::DuplicateId => "E2003",
            Self::IndexOutOfRange => "E2004",
            Self::BoardFileWriteFailed => "E5001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::BoardParseError => "Board file parse error",
            Self::ContainerNotFound => "Container not found",
            Self::ItemNotFound => "Item not found",
            Self::DuplicateId => "Duplicate item or container ID",
            Self::IndexOutOfRange => "Insert index out of range",
            Self::BoardFileWriteFailed => "Board file write failed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .autoflow/config.toml and retry."),
            Self::BoardParseError => Some("Check the board JSON against `af show --json` output."),
            Self::ContainerNotFound => Some("Run `af show` to list container IDs."),
            Self::ItemNotFound => Some("Run `af show` to list item IDs."),
            Self::DuplicateId => Some("Every item and container needs a unique ID."),
            Self::IndexOutOfRange => Some("Use an index between 0 and the container length."),
            Self::BoardFileWriteFailed => Some("Check disk space and write permissions."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised while loading, validating, or saving a board.
///
/// The drag engine itself never returns these: stale targets and bad
/// indices are recovered inside the committer. They come from host-facing
/// entry points such as [`crate::model::Board::load_json`].
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("failed to read board file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse board file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write board file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid board JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("duplicate item id `{0}`")]
    DuplicateItem(ItemId),

    #[error("duplicate container id `{0}`")]
    DuplicateContainer(ContainerId),

    #[error("container `{0}` not found")]
    ContainerNotFound(ContainerId),

    #[error("item `{0}` not found")]
    ItemNotFound(ItemId),
}

impl BoardError {
    /// Machine-readable code associated with this board error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } | Self::Parse { .. } | Self::InvalidJson(_) => {
                ErrorCode::BoardParseError
            }
            Self::Write { .. } => ErrorCode::BoardFileWriteFailed,
            Self::DuplicateItem(_) | Self::DuplicateContainer(_) => ErrorCode::DuplicateId,
            Self::ContainerNotFound(_) => ErrorCode::ContainerNotFound,
            Self::ItemNotFound(_) => ErrorCode::ItemNotFound,
        }
    }

    /// Optional remediation hint for operators and agents.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}
