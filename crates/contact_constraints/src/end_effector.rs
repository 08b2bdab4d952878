//! Affine end-effector constraint.
//!
//! `h(t, x, u) = b + Ax * poseError(x) + Av * twist(x, u) + Aa * accel(x, u)`
//! for a single contact point, with exact Jacobians composed from the
//! channel linearizations of the end-effector evaluator.

use anyhow::Result;
use nalgebra::{DMatrix, DVector, Vector3};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::ConstraintError;
use crate::gains::{
    accumulate_channel, accumulate_pose_error, check_any_channel, check_bias, check_gain,
    pose_error, take_slot, Channel,
};
use crate::traits::{EndEffectorDynamics, PreComputation, StateInputConstraint};
use crate::types::{ground_plane_normal, VectorFunctionLinearApproximation};

/// Coefficients of the affine end-effector constraint.
///
/// Each gain is either empty (the channel is skipped) or `num_constraints x 6`.
#[derive(Debug, Clone, PartialEq)]
pub struct EndEffectorConstraintConfig {
    pub b: DVector<f64>,
    pub ax: DMatrix<f64>,
    pub av: DMatrix<f64>,
    pub aa: DMatrix<f64>,
}

impl EndEffectorConstraintConfig {
    /// Bias only; every channel starts disabled.
    pub fn new(b: DVector<f64>) -> Self {
        Self {
            b,
            ax: DMatrix::zeros(0, 0),
            av: DMatrix::zeros(0, 0),
            aa: DMatrix::zeros(0, 0),
        }
    }

    pub fn with_pose_gain(mut self, ax: DMatrix<f64>) -> Self {
        self.ax = ax;
        self
    }

    pub fn with_twist_gain(mut self, av: DMatrix<f64>) -> Self {
        self.av = av;
        self
    }

    pub fn with_acceleration_gain(mut self, aa: DMatrix<f64>) -> Self {
        self.aa = aa;
        self
    }

    pub fn validate(&self, num_constraints: usize) -> Result<(), ConstraintError> {
        check_bias(&self.b, num_constraints)?;
        check_any_channel(&[&self.ax, &self.av, &self.aa])?;
        check_gain(Channel::PoseError, &self.ax, num_constraints)?;
        check_gain(Channel::Twist, &self.av, num_constraints)?;
        check_gain(Channel::Acceleration, &self.aa, num_constraints)?;
        Ok(())
    }
}

/// Affine combination of pose error, twist and acceleration of one contact point.
#[derive(Clone)]
pub struct EndEffectorConstraint {
    dynamics: Arc<dyn EndEffectorDynamics>,
    num_constraints: usize,
    ground_plane_normal: Vector3<f64>,
    config: EndEffectorConstraintConfig,
    active: bool,
}

impl EndEffectorConstraint {
    /// Binds the constraint to an evaluator exposing exactly one contact point.
    pub fn new(
        dynamics: Arc<dyn EndEffectorDynamics>,
        num_constraints: usize,
        config: EndEffectorConstraintConfig,
    ) -> Result<Self, ConstraintError> {
        let count = dynamics.ids().len();
        if count != 1 {
            return Err(ConstraintError::ContactCount { count });
        }
        config.validate(num_constraints)?;
        debug!(
            contact = dynamics.ids()[0],
            num_constraints, "end-effector constraint created"
        );
        Ok(Self {
            dynamics,
            num_constraints,
            ground_plane_normal: ground_plane_normal(),
            config,
            active: true,
        })
    }

    /// Replaces the coefficients. On error the current configuration stays in effect.
    pub fn configure(
        &mut self,
        config: EndEffectorConstraintConfig,
    ) -> Result<(), ConstraintError> {
        if let Err(err) = config.validate(self.num_constraints) {
            warn!(error = %err, "rejected end-effector constraint configuration");
            return Err(err);
        }
        self.config = config;
        debug!(
            contact = self.contact_point(),
            "end-effector constraint reconfigured"
        );
        Ok(())
    }

    pub fn config(&self) -> &EndEffectorConstraintConfig {
        &self.config
    }

    pub fn contact_point(&self) -> usize {
        self.dynamics.ids()[0]
    }
}

impl fmt::Debug for EndEffectorConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndEffectorConstraint")
            .field("contact_point", &self.contact_point())
            .field("num_constraints", &self.num_constraints)
            .field("config", &self.config)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl StateInputConstraint for EndEffectorConstraint {
    fn is_active(&self, _time: f64) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn active(&self) -> bool {
        self.active
    }

    fn num_constraints(&self, _time: f64) -> usize {
        self.num_constraints
    }

    fn value(
        &self,
        _time: f64,
        state: &DVector<f64>,
        input: &DVector<f64>,
        _pre_comp: &dyn PreComputation,
    ) -> Result<DVector<f64>> {
        let mut f = self.config.b.clone();
        if !self.config.ax.is_empty() {
            let pose = pose_error(&*self.dynamics, 0, state, &self.ground_plane_normal)?;
            f.gemv(1.0, &self.config.ax, &pose, 1.0);
        }
        if !self.config.av.is_empty() {
            let twist = take_slot(self.dynamics.twist(state, input)?, 0, "twist")?;
            f.gemv(1.0, &self.config.av, &twist, 1.0);
        }
        if !self.config.aa.is_empty() {
            let accel = take_slot(self.dynamics.accelerations(state, input)?, 0, "accelerations")?;
            f.gemv(1.0, &self.config.aa, &accel, 1.0);
        }
        Ok(f)
    }

    fn linear_approximation(
        &self,
        time: f64,
        state: &DVector<f64>,
        input: &DVector<f64>,
        _pre_comp: &dyn PreComputation,
    ) -> Result<VectorFunctionLinearApproximation> {
        let mut approx = VectorFunctionLinearApproximation::zero(
            self.num_constraints(time),
            state.len(),
            input.len(),
        );
        approx.f.copy_from(&self.config.b);

        // Only the diagonal blocks of Ax enter the linearization.
        if !self.config.ax.is_empty() {
            accumulate_pose_error(
                &mut approx,
                &self.config.ax,
                &*self.dynamics,
                0,
                state,
                &self.ground_plane_normal,
            )?;
        }
        if !self.config.av.is_empty() {
            let twist = take_slot(
                self.dynamics.twist_linear_approximation(state, input)?,
                0,
                "twist linearization",
            )?;
            accumulate_channel(&mut approx, &self.config.av, &twist, "twist")?;
        }
        if !self.config.aa.is_empty() {
            let accel = take_slot(
                self.dynamics.accelerations_linear_approximation(state, input)?,
                0,
                "accelerations linearization",
            )?;
            accumulate_channel(&mut approx, &self.config.aa, &accel, "accelerations")?;
        }
        Ok(approx)
    }
}
