//! Named constraint terms evaluated together.
//!
//! A term takes part in an evaluation at time `t` when its explicit flag is
//! set and its own `is_active(t)` holds. Rows of participating terms are
//! stacked in insertion order.

use anyhow::{Context, Result};
use nalgebra::DVector;

use crate::constraint::Constraint;
use crate::error::ConstraintError;
use crate::traits::{PreComputation, StateInputConstraint};
use crate::types::VectorFunctionLinearApproximation;

#[derive(Debug, Clone, Default)]
pub struct ConstraintCollection {
    terms: Vec<(String, Constraint)>,
}

impl ConstraintCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        name: impl Into<String>,
        constraint: impl Into<Constraint>,
    ) -> Result<(), ConstraintError> {
        let name = name.into();
        if self.terms.iter().any(|(existing, _)| *existing == name) {
            return Err(ConstraintError::DuplicateTerm(name));
        }
        self.terms.push((name, constraint.into()));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Constraint> {
        self.terms
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, constraint)| constraint)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Constraint> {
        self.terms
            .iter_mut()
            .find(|(existing, _)| existing == name)
            .map(|(_, constraint)| constraint)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    fn participating(&self, time: f64) -> impl Iterator<Item = (&str, &Constraint)> {
        self.terms
            .iter()
            .filter(move |(_, constraint)| constraint.active() && constraint.is_active(time))
            .map(|(name, constraint)| (name.as_str(), constraint))
    }

    pub fn num_active_constraints(&self, time: f64) -> usize {
        self.participating(time)
            .map(|(_, constraint)| constraint.num_constraints(time))
            .sum()
    }

    /// One value vector per participating term.
    pub fn values(
        &self,
        time: f64,
        state: &DVector<f64>,
        input: &DVector<f64>,
        pre_comp: &dyn PreComputation,
    ) -> Result<Vec<DVector<f64>>> {
        self.participating(time)
            .map(|(name, constraint)| {
                constraint
                    .value(time, state, input, pre_comp)
                    .with_context(|| format!("Failed to evaluate constraint term \"{name}\"."))
            })
            .collect()
    }

    /// Linearizations of every participating term stacked row-wise.
    pub fn linear_approximation(
        &self,
        time: f64,
        state: &DVector<f64>,
        input: &DVector<f64>,
        pre_comp: &dyn PreComputation,
    ) -> Result<VectorFunctionLinearApproximation> {
        let mut stacked = VectorFunctionLinearApproximation::zero(
            self.num_active_constraints(time),
            state.len(),
            input.len(),
        );
        let mut row = 0;
        for (name, constraint) in self.participating(time) {
            let approx = constraint
                .linear_approximation(time, state, input, pre_comp)
                .with_context(|| format!("Failed to linearize constraint term \"{name}\"."))?;
            let rows = approx.rows();
            stacked.f.rows_mut(row, rows).copy_from(&approx.f);
            stacked.dfdx.rows_mut(row, rows).copy_from(&approx.dfdx);
            stacked.dfdu.rows_mut(row, rows).copy_from(&approx.dfdu);
            row += rows;
        }
        Ok(stacked)
    }
}
