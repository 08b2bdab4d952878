//! Zero-velocity constraint for planted contacts.
//!
//! Active whenever the contact schedule reports the bound contact point as
//! planted; the residual is the 6D twist of the contact frame as shaped by
//! the internal [`TwistConstraint`].

use anyhow::Result;
use nalgebra::DVector;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::ConstraintError;
use crate::traits::{ContactSchedule, EndEffectorKinematics, PreComputation, StateInputConstraint};
use crate::twist::{TwistConstraint, TwistConstraintConfig};
use crate::types::{VectorFunctionLinearApproximation, SPATIAL_DIM};

#[derive(Clone)]
pub struct ZeroVelocityConstraint {
    schedule: Arc<dyn ContactSchedule>,
    twist: TwistConstraint,
    contact_point: usize,
    active: bool,
}

impl ZeroVelocityConstraint {
    /// `kinematics` must expose `contact_point` and nothing else.
    pub fn new(
        schedule: Arc<dyn ContactSchedule>,
        kinematics: Arc<dyn EndEffectorKinematics>,
        contact_point: usize,
        config: TwistConstraintConfig,
    ) -> Result<Self, ConstraintError> {
        let twist = TwistConstraint::new(kinematics, contact_point, config)?;
        debug!(contact = contact_point, "zero-velocity constraint created");
        Ok(Self {
            schedule,
            twist,
            contact_point,
            active: true,
        })
    }

    /// Pure zero-velocity residual: all six twist components.
    pub fn with_default_config(
        schedule: Arc<dyn ContactSchedule>,
        kinematics: Arc<dyn EndEffectorKinematics>,
        contact_point: usize,
    ) -> Result<Self, ConstraintError> {
        Self::new(schedule, kinematics, contact_point, TwistConstraintConfig::default())
    }

    /// Replaces the twist coefficients. On error the current ones stay in effect.
    pub fn configure_twist(
        &mut self,
        config: TwistConstraintConfig,
    ) -> Result<(), ConstraintError> {
        if let Err(err) = self.twist.configure(config) {
            warn!(
                contact = self.contact_point,
                error = %err,
                "rejected zero-velocity constraint configuration"
            );
            return Err(err);
        }
        Ok(())
    }

    pub fn twist_config(&self) -> &TwistConstraintConfig {
        self.twist.config()
    }

    pub fn contact_point(&self) -> usize {
        self.contact_point
    }
}

impl fmt::Debug for ZeroVelocityConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZeroVelocityConstraint")
            .field("contact_point", &self.contact_point)
            .field("twist", &self.twist)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl StateInputConstraint for ZeroVelocityConstraint {
    /// Schedule-derived; does not consult the explicit flag.
    fn is_active(&self, time: f64) -> bool {
        self.schedule.is_planted(self.contact_point, time)
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn active(&self) -> bool {
        self.active
    }

    fn num_constraints(&self, _time: f64) -> usize {
        SPATIAL_DIM
    }

    fn value(
        &self,
        _time: f64,
        state: &DVector<f64>,
        input: &DVector<f64>,
        _pre_comp: &dyn PreComputation,
    ) -> Result<DVector<f64>> {
        self.twist.value(state, input)
    }

    fn linear_approximation(
        &self,
        _time: f64,
        state: &DVector<f64>,
        input: &DVector<f64>,
        _pre_comp: &dyn PreComputation,
    ) -> Result<VectorFunctionLinearApproximation> {
        self.twist.linear_approximation(state, input)
    }
}
