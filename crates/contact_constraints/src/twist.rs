//! Twist constraint on one contact frame: `b + Ax * poseError(x) + Av * twist(x, u)`.
//!
//! Always six rows. With the default coefficients it reduces to the raw
//! spatial velocity of the contact frame.

use anyhow::Result;
use nalgebra::{DMatrix, DVector, Vector3};
use std::fmt;
use std::sync::Arc;

use crate::error::ConstraintError;
use crate::gains::{
    accumulate_channel, accumulate_pose_error, check_any_channel, check_bias, check_gain,
    pose_error, take_slot, Channel,
};
use crate::traits::EndEffectorKinematics;
use crate::types::{ground_plane_normal, VectorFunctionLinearApproximation, SPATIAL_DIM};

#[derive(Debug, Clone, PartialEq)]
pub struct TwistConstraintConfig {
    pub b: DVector<f64>,
    pub ax: DMatrix<f64>,
    pub av: DMatrix<f64>,
}

impl Default for TwistConstraintConfig {
    fn default() -> Self {
        Self {
            b: DVector::zeros(SPATIAL_DIM),
            ax: DMatrix::zeros(0, 0),
            av: DMatrix::identity(SPATIAL_DIM, SPATIAL_DIM),
        }
    }
}

impl TwistConstraintConfig {
    pub fn validate(&self) -> Result<(), ConstraintError> {
        check_bias(&self.b, SPATIAL_DIM)?;
        check_any_channel(&[&self.ax, &self.av])?;
        check_gain(Channel::PoseError, &self.ax, SPATIAL_DIM)?;
        check_gain(Channel::Twist, &self.av, SPATIAL_DIM)?;
        Ok(())
    }
}

/// Twist constraint bound to an evaluator that exposes exactly one contact point.
#[derive(Clone)]
pub struct TwistConstraint {
    kinematics: Arc<dyn EndEffectorKinematics>,
    ground_plane_normal: Vector3<f64>,
    config: TwistConstraintConfig,
}

impl TwistConstraint {
    /// `kinematics` must be bound to `contact_point` alone, e.g. through
    /// [`AutoDiffEndEffector::restrict_to`](crate::kinematics::AutoDiffEndEffector::restrict_to).
    pub fn new(
        kinematics: Arc<dyn EndEffectorKinematics>,
        contact_point: usize,
        config: TwistConstraintConfig,
    ) -> Result<Self, ConstraintError> {
        match kinematics.ids() {
            [id] if *id == contact_point => {}
            [_] => return Err(ConstraintError::UnknownContact { contact_point }),
            ids => return Err(ConstraintError::ContactCount { count: ids.len() }),
        }
        config.validate()?;
        Ok(Self {
            kinematics,
            ground_plane_normal: ground_plane_normal(),
            config,
        })
    }

    pub fn configure(&mut self, config: TwistConstraintConfig) -> Result<(), ConstraintError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &TwistConstraintConfig {
        &self.config
    }

    pub fn contact_point(&self) -> usize {
        self.kinematics.ids()[0]
    }

    pub fn value(&self, state: &DVector<f64>, input: &DVector<f64>) -> Result<DVector<f64>> {
        let mut f = self.config.b.clone();
        if !self.config.ax.is_empty() {
            let pose = pose_error(&*self.kinematics, 0, state, &self.ground_plane_normal)?;
            f.gemv(1.0, &self.config.ax, &pose, 1.0);
        }
        if !self.config.av.is_empty() {
            let twist = take_slot(self.kinematics.twist(state, input)?, 0, "twist")?;
            f.gemv(1.0, &self.config.av, &twist, 1.0);
        }
        Ok(f)
    }

    pub fn linear_approximation(
        &self,
        state: &DVector<f64>,
        input: &DVector<f64>,
    ) -> Result<VectorFunctionLinearApproximation> {
        let mut approx =
            VectorFunctionLinearApproximation::zero(SPATIAL_DIM, state.len(), input.len());
        approx.f.copy_from(&self.config.b);
        if !self.config.ax.is_empty() {
            accumulate_pose_error(
                &mut approx,
                &self.config.ax,
                &*self.kinematics,
                0,
                state,
                &self.ground_plane_normal,
            )?;
        }
        if !self.config.av.is_empty() {
            let twist = take_slot(
                self.kinematics.twist_linear_approximation(state, input)?,
                0,
                "twist linearization",
            )?;
            accumulate_channel(&mut approx, &self.config.av, &twist, "twist")?;
        }
        Ok(approx)
    }
}

impl fmt::Debug for TwistConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwistConstraint")
            .field("contact_point", &self.contact_point())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
