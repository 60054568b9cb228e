//! Crate-wide error taxonomy.

use thiserror::Error;

/// Alias for results produced throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while expanding, building, matching or
/// rendering a blueprint.
///
/// Only [`Error::InvalidGraph`] is recoverable: it signals that a single
/// derivation turned out to be infeasible and the build driver should move on
/// to the next one. Every other variant aborts the build.
#[derive(Debug, Error)]
pub enum Error {
    /// The blueprint is semantically malformed (missing rule key, empty
    /// required property, ...).
    #[error("invalid blueprint: {0}")]
    InvalidBlueprint(String),

    /// A rule name could not be resolved.
    #[error("unknown rule name '{0}'")]
    UnknownKey(String),

    /// Misuse of the graph API (dangling parent, duplicate link, edge owned
    /// by another node, mutation of a wrapped parent).
    #[error("illegal graph action: {0}")]
    IllegalAction(String),

    /// Splitting preconditions were violated.
    #[error("invalid split: {0}")]
    InvalidSplit(String),

    /// Door placement preconditions were violated.
    #[error("invalid door: {0}")]
    InvalidDoor(String),

    /// A rotated rectangle left its container.
    #[error("invalid rotation: {0}")]
    InvalidRotation(String),

    /// This derivation cannot be laid out; the build driver will try the
    /// next one.
    #[error("infeasible layout: {0}")]
    InvalidGraph(String),

    /// Unrecoverable rule failure: a bug or a guaranteed-bad blueprint.
    #[error("rule preparation failed: {0}")]
    Preparation(String),

    /// [`Graph::leaves`](crate::graph::Graph::leaves) was invoked on a graph
    /// with edges that do not end in leaves.
    #[error("cannot build leaf view: an edge is not inherited down to a leaf")]
    NotLeafable,

    /// Every derivation was rejected.
    #[error("no derivation satisfies all blueprints")]
    NoSolution,

    /// The matcher's cancellation token was triggered.
    #[error("matching was cancelled")]
    Cancelled,

    /// The blueprint bytes are not valid JSON.
    #[error("cannot parse blueprint JSON: {0}")]
    Script(#[from] serde_json::Error),

    /// The tile grid cannot be rendered.
    #[error("cannot render tiles: {0}")]
    Render(String),

    /// Writing the rendered output failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the build driver may recover by trying another derivation.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::InvalidGraph(_))
    }
}
