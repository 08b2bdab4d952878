//! Closed set of constraint kinds handed to the solver.

use anyhow::Result;
use nalgebra::DVector;

use crate::end_effector::EndEffectorConstraint;
use crate::traits::{PreComputation, StateInputConstraint};
use crate::types::{ConstraintOrder, VectorFunctionLinearApproximation};
use crate::zero_velocity::ZeroVelocityConstraint;

/// Any constraint this crate provides. Cloning yields an independent copy
/// that shares only the read-only collaborators.
#[derive(Debug, Clone)]
pub enum Constraint {
    EndEffector(EndEffectorConstraint),
    ZeroVelocity(ZeroVelocityConstraint),
}

impl Constraint {
    fn inner(&self) -> &dyn StateInputConstraint {
        match self {
            Constraint::EndEffector(c) => c,
            Constraint::ZeroVelocity(c) => c,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn StateInputConstraint {
        match self {
            Constraint::EndEffector(c) => c,
            Constraint::ZeroVelocity(c) => c,
        }
    }
}

impl From<EndEffectorConstraint> for Constraint {
    fn from(constraint: EndEffectorConstraint) -> Self {
        Constraint::EndEffector(constraint)
    }
}

impl From<ZeroVelocityConstraint> for Constraint {
    fn from(constraint: ZeroVelocityConstraint) -> Self {
        Constraint::ZeroVelocity(constraint)
    }
}

impl StateInputConstraint for Constraint {
    fn order(&self) -> ConstraintOrder {
        self.inner().order()
    }

    fn is_active(&self, time: f64) -> bool {
        self.inner().is_active(time)
    }

    fn set_active(&mut self, active: bool) {
        self.inner_mut().set_active(active);
    }

    fn active(&self) -> bool {
        self.inner().active()
    }

    fn num_constraints(&self, time: f64) -> usize {
        self.inner().num_constraints(time)
    }

    fn value(
        &self,
        time: f64,
        state: &DVector<f64>,
        input: &DVector<f64>,
        pre_comp: &dyn PreComputation,
    ) -> Result<DVector<f64>> {
        self.inner().value(time, state, input, pre_comp)
    }

    fn linear_approximation(
        &self,
        time: f64,
        state: &DVector<f64>,
        input: &DVector<f64>,
        pre_comp: &dyn PreComputation,
    ) -> Result<VectorFunctionLinearApproximation> {
        self.inner().linear_approximation(time, state, input, pre_comp)
    }
}
