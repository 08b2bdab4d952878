//! Contact constraints for legged-robot trajectory optimization.
//!
//! The crate evaluates and linearizes state-input constraints on contact
//! frames for a host optimal-control solver. Kinematic quantities come from
//! shared evaluators; models written generically over [`traits::Scalar`] get
//! exact derivatives through the `Dual` type in [`autodiff`].
//!
//! Key components:
//! - **Traits**: `EndEffectorKinematics`, `EndEffectorDynamics`, `ContactSchedule`
//!   and `StateInputConstraint`.
//! - **Constraints**: `EndEffectorConstraint` (affine in pose error, twist and
//!   acceleration) and `ZeroVelocityConstraint` (planted contacts), each bound to
//!   a single-contact evaluator.
//! - **Kinematics**: `AutoDiffEndEffector`, which lifts a `ContactModel` into an evaluator.
//! - **Collection**: named terms stacked into one linearization per time point.
pub mod autodiff;
pub mod collection;
pub mod constraint;
pub mod end_effector;
pub mod error;
pub mod gains;
pub mod kinematics;
pub mod schedule;
pub mod settings;
pub mod traits;
pub mod twist;
pub mod types;
pub mod zero_velocity;

#[cfg(test)]
mod test_models;

pub use collection::ConstraintCollection;
pub use constraint::Constraint;
pub use end_effector::{EndEffectorConstraint, EndEffectorConstraintConfig};
pub use error::ConstraintError;
pub use kinematics::{AutoDiffEndEffector, ContactModel, ContactModelLayout};
pub use schedule::ModeSchedule;
pub use traits::{
    ContactSchedule, EndEffectorDynamics, EndEffectorKinematics, NoPreComputation,
    PreComputation, StateInputConstraint,
};
pub use twist::{TwistConstraint, TwistConstraintConfig};
pub use types::{ConstraintOrder, VectorFunctionLinearApproximation};
pub use zero_velocity::ZeroVelocityConstraint;
