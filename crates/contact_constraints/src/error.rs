//! Configuration errors raised while building or reconfiguring constraints.

use thiserror::Error;

use crate::gains::Channel;

/// Errors detected eagerly at construction or reconfiguration time.
///
/// Evaluation never produces these: a constraint that was built successfully
/// only fails at query time when one of its collaborators does.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConstraintError {
    /// A single-contact constraint was bound to an evaluator with a different contact count.
    #[error("this constraint only accepts a single end-effector, evaluator exposes {count}")]
    ContactCount { count: usize },

    /// The requested contact point is not exposed by the kinematics evaluator.
    #[error("contact point {contact_point} is not exposed by the kinematics evaluator")]
    UnknownContact { contact_point: usize },

    /// Every gain matrix is empty.
    #[error("at least one gain matrix must be non-empty")]
    NoActiveChannel,

    /// A gain matrix does not have `num_constraints x 6` shape.
    #[error("gain {channel} has shape {rows}x{cols}, expected {expected_rows}x6")]
    GainShape {
        channel: Channel,
        rows: usize,
        cols: usize,
        expected_rows: usize,
    },

    /// The bias vector length differs from the constraint count.
    #[error("bias has length {len}, expected {expected}")]
    BiasLength { len: usize, expected: usize },

    /// The pose-error channel needs room for its position and orientation blocks.
    #[error("pose-error gain requires at least 3 constraints, got {num_constraints}")]
    TooFewConstraints { num_constraints: usize },

    /// Inconsistent mode schedule.
    #[error("invalid mode schedule: {0}")]
    Schedule(String),

    /// Settings that cannot be turned into a configuration.
    #[error("invalid settings: {0}")]
    Settings(String),

    /// A constraint term with the same name is already registered.
    #[error("duplicate constraint term: {0}")]
    DuplicateTerm(String),
}

impl ConstraintError {
    #[must_use]
    pub fn schedule(reason: impl Into<String>) -> Self {
        Self::Schedule(reason.into())
    }

    #[must_use]
    pub fn settings(reason: impl Into<String>) -> Self {
        Self::Settings(reason.into())
    }
}
