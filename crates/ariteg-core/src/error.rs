use std::fmt;

use ariteg_crypto::UnsupportedAlgorithm;
use ariteg_types::{AritegLink, LinkType, Multihash, StorageStatus};

use crate::config::ConfigError;
use crate::lifecycle::Operation;

/// Boxed underlying cause carried by stage errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Pipeline stage an I/O failure is attributed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Chunk,
    Blob,
    List,
    Tree,
    Commit,
    Index,
}

impl From<LinkType> for Stage {
    fn from(link_type: LinkType) -> Self {
        match link_type {
            LinkType::Blob => Stage::Blob,
            LinkType::List => Stage::List,
            LinkType::Tree => Stage::Tree,
            LinkType::Commit => Stage::Commit,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Chunk => "chunk",
            Stage::Blob => "blob",
            Stage::List => "list",
            Stage::Tree => "tree",
            Stage::Commit => "commit",
            Stage::Index => "index",
        })
    }
}

/// Which way data was flowing when a stage failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Store,
    Restore,
    Delete,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Store => "store",
            Direction::Restore => "restore",
            Direction::Delete => "delete",
        })
    }
}

/// Errors raised by the store/restore pipeline.
#[derive(Debug, thiserror::Error)]
pub enum AritegError {
    /// Backend or codec failure scoped to one stage and direction.
    #[error("{direction} failed at {stage} stage for {target}: {source}")]
    Stage {
        stage: Stage,
        direction: Direction,
        target: String,
        #[source]
        source: BoxError,
    },

    /// Retrieved bytes do not hash to the link's digest.
    #[error("hash mismatch for {link}: computed {computed}")]
    HashMismatch {
        link: AritegLink,
        computed: Multihash,
    },

    /// Retrieved bytes do not match the integrity index's secondary hash.
    #[error("integrity mismatch for {link}: index holds {expected}, computed {computed}")]
    IntegrityMismatch {
        link: AritegLink,
        expected: String,
        computed: String,
    },

    /// A link of the wrong type was handed to a typed operation.
    #[error("expected a {expected} link, got {link}")]
    LinkTypeMismatch {
        link: AritegLink,
        expected: LinkType,
    },

    /// The object's status does not permit the operation right now.
    #[error("illegal status for {operation} of {link}: {status}")]
    IllegalStatus {
        operation: Operation,
        link: AritegLink,
        status: StorageStatus,
    },

    #[error("object not found: {0}")]
    NotFound(AritegLink),

    /// A node references an object that has not been persisted.
    #[error("{parent_stage} references missing object {child}")]
    MissingChild {
        parent_stage: Stage,
        child: AritegLink,
    },

    /// Reconstructing a multi-node object failed somewhere below `link`.
    #[error("failed to restore {link}: {source}")]
    Restoration {
        link: AritegLink,
        #[source]
        source: Box<AritegError>,
    },

    /// The backend could not report an object's status.
    #[error("failed to probe {link}: {source}")]
    Probe {
        link: AritegLink,
        #[source]
        source: BoxError,
    },

    #[error(transparent)]
    Unsupported(#[from] UnsupportedAlgorithm),

    /// The write task was aborted before it resolved.
    #[error("write of {link} was cancelled")]
    Cancelled { link: AritegLink },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AritegError {
    pub(crate) fn stage(
        stage: Stage,
        direction: Direction,
        target: impl fmt::Display,
        source: impl Into<BoxError>,
    ) -> Self {
        AritegError::Stage {
            stage,
            direction,
            target: target.to_string(),
            source: source.into(),
        }
    }

    pub(crate) fn restoration(link: &AritegLink, source: AritegError) -> Self {
        AritegError::Restoration {
            link: link.clone(),
            source: Box::new(source),
        }
    }

    /// The innermost pipeline error, looking through [`AritegError::Restoration`].
    pub fn root_cause(&self) -> &AritegError {
        match self {
            AritegError::Restoration { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Returns `true` for capability gaps (no provider for an algorithm).
    ///
    /// These are skippable: the same call may succeed once the algorithm is
    /// registered.
    pub fn is_unsupported(&self) -> bool {
        matches!(self.root_cause(), AritegError::Unsupported(_))
    }

    /// Returns `true` if content was retrieved but failed verification.
    pub fn is_verification(&self) -> bool {
        matches!(
            self.root_cause(),
            AritegError::HashMismatch { .. }
                | AritegError::IntegrityMismatch { .. }
                | AritegError::LinkTypeMismatch { .. }
                | AritegError::IllegalStatus { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root_cause(), AritegError::NotFound(_))
    }
}

/// Convenience alias for pipeline results.
pub type AritegResult<T> = Result<T, AritegError>;
