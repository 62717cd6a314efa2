//! Framework error type.
//!
//! Sub-crates define their own error enums and either convert into
//! `CoreError` via `From` impls or wrap it as one variant.  Agent-level
//! failures never surface here — they resolve to failed intentions inside a
//! single tick (see the error-handling policy in the top-level docs).

use thiserror::Error;

use crate::ids::{AgentId, NodeId};

/// The top-level error type for `mats-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `mats-*` crates.
pub type CoreResult<T> = Result<T, CoreError>;
