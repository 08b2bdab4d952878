use anyhow::Result;
use nalgebra::{DVector, Vector3, Vector6};
use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

use crate::types::{ConstraintOrder, VectorFunctionLinearApproximation};

/// A trait for types that kinematic models can be evaluated with.
/// Implemented by `f64` for values and by `Dual` for exact derivatives.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// Opaque per-query cache owned by the host solver.
/// Constraints receive it by reference and never inspect or modify it.
pub trait PreComputation: Send + Sync {}

/// Placeholder cache for callers that do not precompute anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPreComputation;

impl PreComputation for NoPreComputation {}

/// Answers whether a contact point is planted at a given time.
pub trait ContactSchedule: Send + Sync {
    fn is_planted(&self, contact_point: usize, time: f64) -> bool;
}

/// Kinematic quantities of a set of contact frames.
///
/// Every query returns one entry per id in [`EndEffectorKinematics::ids`], in
/// the same order. Implementations are shared read-only between constraint
/// clones, possibly from several threads at once.
pub trait EndEffectorKinematics: Send + Sync {
    /// Contact point ids this evaluator is bound to.
    fn ids(&self) -> &[usize];

    fn position(&self, state: &DVector<f64>) -> Result<Vec<Vector3<f64>>>;

    fn position_linear_approximation(
        &self,
        state: &DVector<f64>,
    ) -> Result<Vec<VectorFunctionLinearApproximation>>;

    /// Orientation error of each frame with respect to the plane with the given normal.
    fn orientation_error_wrt_plane(
        &self,
        state: &DVector<f64>,
        plane_normals: &[Vector3<f64>],
    ) -> Result<Vec<Vector3<f64>>>;

    fn orientation_error_wrt_plane_linear_approximation(
        &self,
        state: &DVector<f64>,
        plane_normals: &[Vector3<f64>],
    ) -> Result<Vec<VectorFunctionLinearApproximation>>;

    /// Spatial velocity `[linear; angular]` of each frame.
    fn twist(&self, state: &DVector<f64>, input: &DVector<f64>) -> Result<Vec<Vector6<f64>>>;

    fn twist_linear_approximation(
        &self,
        state: &DVector<f64>,
        input: &DVector<f64>,
    ) -> Result<Vec<VectorFunctionLinearApproximation>>;
}

/// Kinematics extended with spatial accelerations.
pub trait EndEffectorDynamics: EndEffectorKinematics {
    /// Spatial acceleration `[linear; angular]` of each frame.
    fn accelerations(
        &self,
        state: &DVector<f64>,
        input: &DVector<f64>,
    ) -> Result<Vec<Vector6<f64>>>;

    fn accelerations_linear_approximation(
        &self,
        state: &DVector<f64>,
        input: &DVector<f64>,
    ) -> Result<Vec<VectorFunctionLinearApproximation>>;
}

/// Contract between a constraint and the host optimal-control solver.
///
/// Duplication for worker threads is plain `Clone` on the implementing type.
pub trait StateInputConstraint: Send + Sync {
    fn order(&self) -> ConstraintOrder {
        ConstraintOrder::Linear
    }

    /// Whether the constraint applies at `time`.
    fn is_active(&self, time: f64) -> bool;

    /// Explicit enable flag, independent of any time-dependent activation.
    fn set_active(&mut self, active: bool);

    fn active(&self) -> bool;

    fn num_constraints(&self, time: f64) -> usize;

    fn value(
        &self,
        time: f64,
        state: &DVector<f64>,
        input: &DVector<f64>,
        pre_comp: &dyn PreComputation,
    ) -> Result<DVector<f64>>;

    fn linear_approximation(
        &self,
        time: f64,
        state: &DVector<f64>,
        input: &DVector<f64>,
        pre_comp: &dyn PreComputation,
    ) -> Result<VectorFunctionLinearApproximation>;
}
