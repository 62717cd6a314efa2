//! Simulation-level error type.
//!
//! Per the system error policy, only initialization can fail: everything
//! that goes wrong mid-run (routing failures, dropped messages, failed
//! intentions) resolves locally inside a single agent's tick.

use thiserror::Error;

use mats_core::CoreError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("world has no crisis manager")]
    MissingCrisisManager,
}

pub type SimResult<T> = Result<T, SimError>;
