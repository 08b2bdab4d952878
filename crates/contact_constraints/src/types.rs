//! Core value types shared by every constraint kind.

use nalgebra::{DMatrix, DVector, Vector3};

/// Number of components of a spatial vector (3 linear + 3 angular).
pub const SPATIAL_DIM: usize = 6;

/// Normal of the flat ground plane that pose errors are measured against.
pub fn ground_plane_normal() -> Vector3<f64> {
    Vector3::new(0.0, 0.0, 1.0)
}

/// Order of the constraint function in the decision variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOrder {
    Linear,
}

/// First-order model `f + dfdx * dx + dfdu * du` of a vector function around a point.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorFunctionLinearApproximation {
    pub f: DVector<f64>,
    pub dfdx: DMatrix<f64>,
    pub dfdu: DMatrix<f64>,
}

impl VectorFunctionLinearApproximation {
    /// All-zero approximation with `rows` outputs.
    pub fn zero(rows: usize, state_dim: usize, input_dim: usize) -> Self {
        Self {
            f: DVector::zeros(rows),
            dfdx: DMatrix::zeros(rows, state_dim),
            dfdu: DMatrix::zeros(rows, input_dim),
        }
    }

    pub fn rows(&self) -> usize {
        self.f.len()
    }

    pub fn state_dim(&self) -> usize {
        self.dfdx.ncols()
    }

    pub fn input_dim(&self) -> usize {
        self.dfdu.ncols()
    }

    /// Evaluates the affine model at the offset `(dx, du)`.
    pub fn evaluate(&self, dx: &DVector<f64>, du: &DVector<f64>) -> DVector<f64> {
        let mut out = self.f.clone();
        out.gemv(1.0, &self.dfdx, dx, 1.0);
        out.gemv(1.0, &self.dfdu, du, 1.0);
        out
    }
}
