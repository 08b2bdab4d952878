//! Serializable gain settings.
//!
//! Gains are written row-major; an empty list disables the channel. Shape
//! validation against the constraint count happens when the resulting
//! configuration is handed to a constraint.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::end_effector::EndEffectorConstraintConfig;
use crate::error::ConstraintError;
use crate::twist::TwistConstraintConfig;
use crate::types::SPATIAL_DIM;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndEffectorConstraintSettings {
    pub b: Vec<f64>,
    #[serde(default)]
    pub ax: Vec<Vec<f64>>,
    #[serde(default)]
    pub av: Vec<Vec<f64>>,
    #[serde(default)]
    pub aa: Vec<Vec<f64>>,
}

impl TryFrom<EndEffectorConstraintSettings> for EndEffectorConstraintConfig {
    type Error = ConstraintError;

    fn try_from(settings: EndEffectorConstraintSettings) -> Result<Self, Self::Error> {
        Ok(EndEffectorConstraintConfig {
            b: DVector::from_vec(settings.b),
            ax: matrix_from_rows("Ax", &settings.ax)?,
            av: matrix_from_rows("Av", &settings.av)?,
            aa: matrix_from_rows("Aa", &settings.aa)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwistConstraintSettings {
    #[serde(default = "zero_bias")]
    pub b: Vec<f64>,
    #[serde(default)]
    pub ax: Vec<Vec<f64>>,
    #[serde(default = "identity_rows")]
    pub av: Vec<Vec<f64>>,
}

impl Default for TwistConstraintSettings {
    fn default() -> Self {
        Self {
            b: zero_bias(),
            ax: Vec::new(),
            av: identity_rows(),
        }
    }
}

impl TryFrom<TwistConstraintSettings> for TwistConstraintConfig {
    type Error = ConstraintError;

    fn try_from(settings: TwistConstraintSettings) -> Result<Self, Self::Error> {
        Ok(TwistConstraintConfig {
            b: DVector::from_vec(settings.b),
            ax: matrix_from_rows("Ax", &settings.ax)?,
            av: matrix_from_rows("Av", &settings.av)?,
        })
    }
}

fn zero_bias() -> Vec<f64> {
    vec![0.0; SPATIAL_DIM]
}

fn identity_rows() -> Vec<Vec<f64>> {
    (0..SPATIAL_DIM)
        .map(|i| (0..SPATIAL_DIM).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect()
}

fn matrix_from_rows(name: &str, rows: &[Vec<f64>]) -> Result<DMatrix<f64>, ConstraintError> {
    let Some(first) = rows.first() else {
        return Ok(DMatrix::zeros(0, 0));
    };
    let cols = first.len();
    if let Some(index) = rows.iter().position(|row| row.len() != cols) {
        return Err(ConstraintError::settings(format!(
            "{name} row {index} has {} entries, expected {cols}",
            rows[index].len()
        )));
    }
    Ok(DMatrix::from_fn(rows.len(), cols, |i, j| rows[i][j]))
}
