//! Contact-frame kinematics with exact Jacobians from forward-mode AD.
//!
//! A kinematic model is written once against [`ContactModel<T>`] and
//! implemented for both `f64` and [`Dual`]. [`AutoDiffEndEffector`] then
//! evaluates values with `f64` and Jacobians by seeding dual directions,
//! so the derivatives stay exact however deep the kinematic chain is.

use anyhow::{bail, Result};
use nalgebra::{DVector, Vector3, Vector6};
use std::fmt;
use std::sync::Arc;

use crate::autodiff::{linearize, Dual};
use crate::error::ConstraintError;
use crate::traits::{EndEffectorDynamics, EndEffectorKinematics, Scalar};
use crate::types::VectorFunctionLinearApproximation;

/// Dimensions and contact frames of a kinematic model.
pub trait ContactModelLayout: Send + Sync {
    fn state_dim(&self) -> usize;
    fn input_dim(&self) -> usize;
    /// Contact point ids the model can evaluate.
    fn contact_ids(&self) -> &[usize];
}

/// Scalar-generic contact-frame kinematics.
///
/// `contact` is a contact point id from [`ContactModelLayout::contact_ids`].
pub trait ContactModel<T: Scalar>: ContactModelLayout {
    /// World position of the contact frame.
    fn position(&self, contact: usize, state: &[T]) -> [T; 3];

    /// World-from-contact rotation, row-major.
    fn rotation(&self, contact: usize, state: &[T]) -> [[T; 3]; 3];

    /// Spatial velocity `[linear; angular]` in world coordinates.
    fn twist(&self, contact: usize, state: &[T], input: &[T]) -> [T; 6];

    /// Spatial acceleration `[linear; angular]` in world coordinates.
    fn acceleration(&self, contact: usize, state: &[T], input: &[T]) -> [T; 6];
}

/// Converts a constant into the model scalar.
pub fn lift<T: Scalar>(value: f64) -> T {
    T::from_f64(value).unwrap_or_else(T::nan)
}

/// `z_contact x n`: zero when the contact frame's z-axis is aligned with the plane normal.
pub fn orientation_error_wrt_plane<T: Scalar>(
    rotation: &[[T; 3]; 3],
    normal: &Vector3<f64>,
) -> [T; 3] {
    let z = [rotation[0][2], rotation[1][2], rotation[2][2]];
    let n = [lift::<T>(normal.x), lift::<T>(normal.y), lift::<T>(normal.z)];
    [
        z[1] * n[2] - z[2] * n[1],
        z[2] * n[0] - z[0] * n[2],
        z[0] * n[1] - z[1] * n[0],
    ]
}

/// [`EndEffectorDynamics`] view of a [`ContactModel`], bound to a subset of its contacts.
pub struct AutoDiffEndEffector<M> {
    model: Arc<M>,
    ids: Vec<usize>,
}

impl<M> Clone for AutoDiffEndEffector<M> {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            ids: self.ids.clone(),
        }
    }
}

impl<M> fmt::Debug for AutoDiffEndEffector<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoDiffEndEffector")
            .field("ids", &self.ids)
            .finish_non_exhaustive()
    }
}

impl<M: ContactModelLayout> AutoDiffEndEffector<M> {
    /// Binds to every contact of the model.
    pub fn new(model: M) -> Self {
        Self::from_shared(Arc::new(model))
    }

    pub fn from_shared(model: Arc<M>) -> Self {
        let ids = model.contact_ids().to_vec();
        Self { model, ids }
    }

    /// Same model, bound to `ids` only.
    pub fn restrict_to(&self, ids: &[usize]) -> Result<Self, ConstraintError> {
        let known = self.model.contact_ids();
        if let Some(&missing) = ids.iter().find(|&&id| !known.contains(&id)) {
            return Err(ConstraintError::UnknownContact {
                contact_point: missing,
            });
        }
        Ok(Self {
            model: Arc::clone(&self.model),
            ids: ids.to_vec(),
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    fn check_state(&self, state: &DVector<f64>) -> Result<()> {
        if state.len() != self.model.state_dim() {
            bail!(
                "State dimension mismatch. Expected {}, got {}.",
                self.model.state_dim(),
                state.len()
            );
        }
        Ok(())
    }

    fn check_state_input(&self, state: &DVector<f64>, input: &DVector<f64>) -> Result<()> {
        self.check_state(state)?;
        if input.len() != self.model.input_dim() {
            bail!(
                "Input dimension mismatch. Expected {}, got {}.",
                self.model.input_dim(),
                input.len()
            );
        }
        Ok(())
    }

    fn check_normals(&self, plane_normals: &[Vector3<f64>]) -> Result<()> {
        if plane_normals.len() != self.ids.len() {
            bail!(
                "Expected one plane normal per contact ({}), got {}.",
                self.ids.len(),
                plane_normals.len()
            );
        }
        Ok(())
    }
}

impl<M> EndEffectorKinematics for AutoDiffEndEffector<M>
where
    M: ContactModel<f64> + ContactModel<Dual>,
{
    fn ids(&self) -> &[usize] {
        &self.ids
    }

    fn position(&self, state: &DVector<f64>) -> Result<Vec<Vector3<f64>>> {
        self.check_state(state)?;
        Ok(self
            .ids
            .iter()
            .map(|&id| {
                let p = ContactModel::<f64>::position(&*self.model, id, state.as_slice());
                Vector3::from(p)
            })
            .collect())
    }

    fn position_linear_approximation(
        &self,
        state: &DVector<f64>,
    ) -> Result<Vec<VectorFunctionLinearApproximation>> {
        self.check_state(state)?;
        let model = &*self.model;
        Ok(self
            .ids
            .iter()
            .map(|&id| {
                linearize(state.as_slice(), &[], |x, _| {
                    ContactModel::<Dual>::position(model, id, x)
                })
            })
            .collect())
    }

    fn orientation_error_wrt_plane(
        &self,
        state: &DVector<f64>,
        plane_normals: &[Vector3<f64>],
    ) -> Result<Vec<Vector3<f64>>> {
        self.check_state(state)?;
        self.check_normals(plane_normals)?;
        Ok(self
            .ids
            .iter()
            .zip(plane_normals)
            .map(|(&id, normal)| {
                let rotation = ContactModel::<f64>::rotation(&*self.model, id, state.as_slice());
                Vector3::from(orientation_error_wrt_plane(&rotation, normal))
            })
            .collect())
    }

    fn orientation_error_wrt_plane_linear_approximation(
        &self,
        state: &DVector<f64>,
        plane_normals: &[Vector3<f64>],
    ) -> Result<Vec<VectorFunctionLinearApproximation>> {
        self.check_state(state)?;
        self.check_normals(plane_normals)?;
        let model = &*self.model;
        Ok(self
            .ids
            .iter()
            .zip(plane_normals)
            .map(|(&id, normal)| {
                linearize(state.as_slice(), &[], |x, _| {
                    let rotation = ContactModel::<Dual>::rotation(model, id, x);
                    orientation_error_wrt_plane(&rotation, normal)
                })
            })
            .collect())
    }

    fn twist(&self, state: &DVector<f64>, input: &DVector<f64>) -> Result<Vec<Vector6<f64>>> {
        self.check_state_input(state, input)?;
        Ok(self
            .ids
            .iter()
            .map(|&id| {
                let v = ContactModel::<f64>::twist(
                    &*self.model,
                    id,
                    state.as_slice(),
                    input.as_slice(),
                );
                Vector6::from(v)
            })
            .collect())
    }

    fn twist_linear_approximation(
        &self,
        state: &DVector<f64>,
        input: &DVector<f64>,
    ) -> Result<Vec<VectorFunctionLinearApproximation>> {
        self.check_state_input(state, input)?;
        let model = &*self.model;
        Ok(self
            .ids
            .iter()
            .map(|&id| {
                linearize(state.as_slice(), input.as_slice(), |x, u| {
                    ContactModel::<Dual>::twist(model, id, x, u)
                })
            })
            .collect())
    }
}

impl<M> EndEffectorDynamics for AutoDiffEndEffector<M>
where
    M: ContactModel<f64> + ContactModel<Dual>,
{
    fn accelerations(
        &self,
        state: &DVector<f64>,
        input: &DVector<f64>,
    ) -> Result<Vec<Vector6<f64>>> {
        self.check_state_input(state, input)?;
        Ok(self
            .ids
            .iter()
            .map(|&id| {
                let a = ContactModel::<f64>::acceleration(
                    &*self.model,
                    id,
                    state.as_slice(),
                    input.as_slice(),
                );
                Vector6::from(a)
            })
            .collect())
    }

    fn accelerations_linear_approximation(
        &self,
        state: &DVector<f64>,
        input: &DVector<f64>,
    ) -> Result<Vec<VectorFunctionLinearApproximation>> {
        self.check_state_input(state, input)?;
        let model = &*self.model;
        Ok(self
            .ids
            .iter()
            .map(|&id| {
                linearize(state.as_slice(), input.as_slice(), |x, u| {
                    ContactModel::<Dual>::acceleration(model, id, x, u)
                })
            })
            .collect())
    }
}
