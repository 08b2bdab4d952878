//! Gain validation and composition shared by the affine constraint kinds.
//!
//! A constraint of this family has the form `b + sum_k A_k * channel_k(x, u)`
//! where every channel is a 6D spatial quantity of one contact frame. Gains
//! are either empty, in which case the channel is skipped, or
//! `num_constraints x 6`.

use anyhow::{anyhow, bail, Result};
use nalgebra::{DMatrix, DVector, Vector3, Vector6};
use std::fmt;

use crate::error::ConstraintError;
use crate::traits::EndEffectorKinematics;
use crate::types::{VectorFunctionLinearApproximation, SPATIAL_DIM};

/// Physical channel a gain matrix acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Position and orientation error w.r.t. the ground plane (`Ax`).
    PoseError,
    /// Spatial velocity (`Av`).
    Twist,
    /// Spatial acceleration (`Aa`).
    Acceleration,
}

impl Channel {
    pub fn gain_name(self) -> &'static str {
        match self {
            Channel::PoseError => "Ax",
            Channel::Twist => "Av",
            Channel::Acceleration => "Aa",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.gain_name())
    }
}

pub(crate) fn check_bias(b: &DVector<f64>, num_constraints: usize) -> Result<(), ConstraintError> {
    if b.len() != num_constraints {
        return Err(ConstraintError::BiasLength {
            len: b.len(),
            expected: num_constraints,
        });
    }
    Ok(())
}

pub(crate) fn check_gain(
    channel: Channel,
    gain: &DMatrix<f64>,
    num_constraints: usize,
) -> Result<(), ConstraintError> {
    if gain.is_empty() {
        return Ok(());
    }
    if gain.nrows() != num_constraints || gain.ncols() != SPATIAL_DIM {
        return Err(ConstraintError::GainShape {
            channel,
            rows: gain.nrows(),
            cols: gain.ncols(),
            expected_rows: num_constraints,
        });
    }
    if channel == Channel::PoseError && num_constraints < 3 {
        return Err(ConstraintError::TooFewConstraints { num_constraints });
    }
    Ok(())
}

pub(crate) fn check_any_channel(gains: &[&DMatrix<f64>]) -> Result<(), ConstraintError> {
    if gains.iter().all(|gain| gain.is_empty()) {
        return Err(ConstraintError::NoActiveChannel);
    }
    Ok(())
}

/// Picks the entry belonging to `slot` out of a per-contact result list.
pub(crate) fn take_slot<T>(values: Vec<T>, slot: usize, what: &str) -> Result<T> {
    let count = values.len();
    values
        .into_iter()
        .nth(slot)
        .ok_or_else(|| {
            anyhow!("{what} returned {count} entries, expected an entry at index {slot}")
        })
}

/// Position stacked on top of the orientation error w.r.t. the ground plane.
pub(crate) fn pose_error<K>(
    kinematics: &K,
    slot: usize,
    state: &DVector<f64>,
    plane_normal: &Vector3<f64>,
) -> Result<Vector6<f64>>
where
    K: EndEffectorKinematics + ?Sized,
{
    let position = take_slot(kinematics.position(state)?, slot, "position")?;
    let normals = vec![*plane_normal; kinematics.ids().len()];
    let orientation = take_slot(
        kinematics.orientation_error_wrt_plane(state, &normals)?,
        slot,
        "orientation error",
    )?;
    let mut pose = Vector6::zeros();
    pose.fixed_rows_mut::<3>(0).copy_from(&position);
    pose.fixed_rows_mut::<3>(3).copy_from(&orientation);
    Ok(pose)
}

/// Adds the pose-error channel to `approx` through the diagonal blocks of `ax`.
///
/// The top-left 3x3 block maps the position onto the first three rows and the
/// bottom-right 3x3 block maps the orientation error onto the last three
/// rows. Position/orientation coupling terms of `ax` are not linearized.
pub(crate) fn accumulate_pose_error<K>(
    approx: &mut VectorFunctionLinearApproximation,
    ax: &DMatrix<f64>,
    kinematics: &K,
    slot: usize,
    state: &DVector<f64>,
    plane_normal: &Vector3<f64>,
) -> Result<()>
where
    K: EndEffectorKinematics + ?Sized,
{
    let position = take_slot(
        kinematics.position_linear_approximation(state)?,
        slot,
        "position linearization",
    )?;
    let normals = vec![*plane_normal; kinematics.ids().len()];
    let orientation = take_slot(
        kinematics.orientation_error_wrt_plane_linear_approximation(state, &normals)?,
        slot,
        "orientation error linearization",
    )?;
    ensure_state_shape(&position, 3, approx.state_dim(), "position")?;
    ensure_state_shape(&orientation, 3, approx.state_dim(), "orientation error")?;

    let rows = approx.rows();
    let position_gain = ax.view((0, 0), (3, 3));
    let orientation_gain = ax.view((rows - 3, 3), (3, 3));

    approx.f.rows_mut(0, 3).gemv(1.0, &position_gain, &position.f, 1.0);
    approx
        .f
        .rows_mut(rows - 3, 3)
        .gemv(1.0, &orientation_gain, &orientation.f, 1.0);
    approx
        .dfdx
        .rows_mut(0, 3)
        .gemm(1.0, &position_gain, &position.dfdx, 1.0);
    approx
        .dfdx
        .rows_mut(rows - 3, 3)
        .gemm(1.0, &orientation_gain, &orientation.dfdx, 1.0);
    Ok(())
}

/// Adds `gain * channel` to the value and both Jacobians of `approx`.
pub(crate) fn accumulate_channel(
    approx: &mut VectorFunctionLinearApproximation,
    gain: &DMatrix<f64>,
    channel: &VectorFunctionLinearApproximation,
    what: &str,
) -> Result<()> {
    ensure_state_shape(channel, SPATIAL_DIM, approx.state_dim(), what)?;
    if channel.input_dim() != approx.input_dim() {
        bail!(
            "{what} input Jacobian has {} columns, expected {}",
            channel.input_dim(),
            approx.input_dim()
        );
    }
    approx.f.gemv(1.0, gain, &channel.f, 1.0);
    approx.dfdx.gemm(1.0, gain, &channel.dfdx, 1.0);
    approx.dfdu.gemm(1.0, gain, &channel.dfdu, 1.0);
    Ok(())
}

fn ensure_state_shape(
    channel: &VectorFunctionLinearApproximation,
    rows: usize,
    state_dim: usize,
    what: &str,
) -> Result<()> {
    if channel.rows() != rows || channel.dfdx.nrows() != rows || channel.state_dim() != state_dim {
        bail!(
            "{what} linearization has shape {}x{}, expected {}x{}",
            channel.dfdx.nrows(),
            channel.state_dim(),
            rows,
            state_dim
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{check_any_channel, check_bias, check_gain, take_slot, Channel};
    use crate::error::ConstraintError;
    use nalgebra::{DMatrix, DVector};

    #[test]
    fn empty_gain_is_always_valid() {
        let empty = DMatrix::<f64>::zeros(0, 0);
        assert!(check_gain(Channel::Acceleration, &empty, 1).is_ok());
        assert!(check_gain(Channel::PoseError, &empty, 1).is_ok());
    }

    #[test]
    fn gain_shape_is_checked_against_constraint_count() {
        let gain = DMatrix::<f64>::zeros(4, 6);
        assert!(check_gain(Channel::Twist, &gain, 4).is_ok());
        assert_eq!(
            check_gain(Channel::Twist, &gain, 3),
            Err(ConstraintError::GainShape {
                channel: Channel::Twist,
                rows: 4,
                cols: 6,
                expected_rows: 3,
            })
        );
        let narrow = DMatrix::<f64>::zeros(4, 3);
        assert!(matches!(
            check_gain(Channel::Acceleration, &narrow, 4),
            Err(ConstraintError::GainShape { cols: 3, .. })
        ));
    }

    #[test]
    fn pose_gain_needs_three_rows() {
        let gain = DMatrix::<f64>::zeros(2, 6);
        assert_eq!(
            check_gain(Channel::PoseError, &gain, 2),
            Err(ConstraintError::TooFewConstraints { num_constraints: 2 })
        );
        assert!(check_gain(Channel::Twist, &gain, 2).is_ok());
    }

    #[test]
    fn bias_and_channel_presence() {
        assert!(check_bias(&DVector::zeros(3), 3).is_ok());
        assert_eq!(
            check_bias(&DVector::zeros(2), 3),
            Err(ConstraintError::BiasLength { len: 2, expected: 3 })
        );
        let empty = DMatrix::<f64>::zeros(0, 0);
        let full = DMatrix::<f64>::zeros(3, 6);
        assert_eq!(
            check_any_channel(&[&empty, &empty, &empty]),
            Err(ConstraintError::NoActiveChannel)
        );
        assert!(check_any_channel(&[&empty, &full, &empty]).is_ok());
    }

    #[test]
    fn take_slot_reports_missing_entries() {
        assert_eq!(take_slot(vec![1, 2], 1, "twist").unwrap(), 2);
        let err = take_slot(Vec::<i32>::new(), 0, "twist").unwrap_err();
        assert!(format!("{err}").contains("twist returned 0 entries"));
    }
}
