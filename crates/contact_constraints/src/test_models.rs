//! Kinematic models and numerical helpers for unit tests.

use nalgebra::{DMatrix, DVector};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::kinematics::{lift, ContactModel, ContactModelLayout};
use crate::traits::Scalar;

/// Floating base carrying planar two-link legs (hip pitch, knee pitch).
///
/// State: `[base_pos(3), q(2k), base_vel(3), qd(2k)]`.
/// Input: `[base_acc(3), qdd(2k)]`.
/// Leg `s` hangs from the hip offset `(0.05 * s, 0.15 * s, 0)`.
#[derive(Debug, Clone)]
pub struct PlanarLegs {
    ids: Vec<usize>,
    pub thigh: f64,
    pub shank: f64,
}

impl PlanarLegs {
    pub fn new(ids: &[usize]) -> Self {
        Self {
            ids: ids.to_vec(),
            thigh: 0.3,
            shank: 0.25,
        }
    }

    fn legs(&self) -> usize {
        self.ids.len()
    }

    fn slot(&self, contact: usize) -> usize {
        self.ids
            .iter()
            .position(|&id| id == contact)
            .expect("contact belongs to the model")
    }

    fn joint_index(&self, slot: usize) -> usize {
        3 + 2 * slot
    }

    fn joint_velocity_index(&self, slot: usize) -> usize {
        6 + 2 * self.legs() + 2 * slot
    }

    pub fn nominal_state(&self) -> DVector<f64> {
        let n = self.legs();
        let mut state = DVector::zeros(self.state_dim());
        state[0] = 0.1;
        state[1] = -0.2;
        state[2] = 0.55;
        for s in 0..n {
            state[3 + 2 * s] = 0.4 + 0.1 * s as f64;
            state[4 + 2 * s] = -0.8 + 0.05 * s as f64;
        }
        state[3 + 2 * n] = 0.3;
        state[4 + 2 * n] = -0.1;
        state[5 + 2 * n] = 0.05;
        for s in 0..n {
            state[6 + 2 * n + 2 * s] = 1.2 - 0.3 * s as f64;
            state[7 + 2 * n + 2 * s] = -0.7 + 0.2 * s as f64;
        }
        state
    }

    pub fn nominal_input(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.input_dim(),
            (0..self.input_dim()).map(|i| 0.3 * (i as f64 + 1.0).sin()),
        )
    }

    /// State that puts the first leg's foot at `foot` with both joints at zero.
    pub fn state_with_first_foot_at(&self, foot: [f64; 3]) -> DVector<f64> {
        let mut state = DVector::zeros(self.state_dim());
        state[0] = foot[0];
        state[1] = foot[1];
        state[2] = foot[2] + self.thigh + self.shank;
        state
    }
}

impl ContactModelLayout for PlanarLegs {
    fn state_dim(&self) -> usize {
        6 + 4 * self.legs()
    }

    fn input_dim(&self) -> usize {
        3 + 2 * self.legs()
    }

    fn contact_ids(&self) -> &[usize] {
        &self.ids
    }
}

impl<T: Scalar> ContactModel<T> for PlanarLegs {
    fn position(&self, contact: usize, state: &[T]) -> [T; 3] {
        let slot = self.slot(contact);
        let (l1, l2) = (lift::<T>(self.thigh), lift::<T>(self.shank));
        let j = self.joint_index(slot);
        let (hip, knee) = (state[j], state[j + 1]);
        let sum = hip + knee;
        [
            state[0] + lift::<T>(0.05 * slot as f64) - l1 * hip.sin() - l2 * sum.sin(),
            state[1] + lift::<T>(0.15 * slot as f64),
            state[2] - l1 * hip.cos() - l2 * sum.cos(),
        ]
    }

    fn rotation(&self, contact: usize, state: &[T]) -> [[T; 3]; 3] {
        let j = self.joint_index(self.slot(contact));
        let (s, c) = (state[j] + state[j + 1]).sin_cos();
        let (zero, one) = (T::zero(), T::one());
        [[c, zero, s], [zero, one, zero], [-s, zero, c]]
    }

    fn twist(&self, contact: usize, state: &[T], _input: &[T]) -> [T; 6] {
        let slot = self.slot(contact);
        let n = self.legs();
        let (l1, l2) = (lift::<T>(self.thigh), lift::<T>(self.shank));
        let j = self.joint_index(slot);
        let jv = self.joint_velocity_index(slot);
        let (hip, knee) = (state[j], state[j + 1]);
        let (hip_rate, knee_rate) = (state[jv], state[jv + 1]);
        let sum = hip + knee;
        let sum_rate = hip_rate + knee_rate;
        let base_vel = 3 + 2 * n;
        [
            state[base_vel] - l1 * hip.cos() * hip_rate - l2 * sum.cos() * sum_rate,
            state[base_vel + 1],
            state[base_vel + 2] + l1 * hip.sin() * hip_rate + l2 * sum.sin() * sum_rate,
            T::zero(),
            sum_rate,
            T::zero(),
        ]
    }

    fn acceleration(&self, contact: usize, state: &[T], input: &[T]) -> [T; 6] {
        let slot = self.slot(contact);
        let (l1, l2) = (lift::<T>(self.thigh), lift::<T>(self.shank));
        let j = self.joint_index(slot);
        let jv = self.joint_velocity_index(slot);
        let (hip, knee) = (state[j], state[j + 1]);
        let (hip_rate, knee_rate) = (state[jv], state[jv + 1]);
        let (hip_acc, knee_acc) = (input[3 + 2 * slot], input[4 + 2 * slot]);
        let sum = hip + knee;
        let sum_rate = hip_rate + knee_rate;
        let sum_acc = hip_acc + knee_acc;
        [
            input[0] + l1 * hip.sin() * hip_rate * hip_rate - l1 * hip.cos() * hip_acc
                + l2 * sum.sin() * sum_rate * sum_rate
                - l2 * sum.cos() * sum_acc,
            input[1],
            input[2]
                + l1 * hip.cos() * hip_rate * hip_rate
                + l1 * hip.sin() * hip_acc
                + l2 * sum.cos() * sum_rate * sum_rate
                + l2 * sum.sin() * sum_acc,
            T::zero(),
            sum_acc,
            T::zero(),
        ]
    }
}

/// Wraps a model and counts its twist evaluations over every scalar type.
pub struct CountingModel<M> {
    inner: M,
    twist_calls: AtomicUsize,
}

impl<M> CountingModel<M> {
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            twist_calls: AtomicUsize::new(0),
        }
    }

    pub fn twist_calls(&self) -> usize {
        self.twist_calls.load(Ordering::SeqCst)
    }
}

impl<M: ContactModelLayout> ContactModelLayout for CountingModel<M> {
    fn state_dim(&self) -> usize {
        self.inner.state_dim()
    }

    fn input_dim(&self) -> usize {
        self.inner.input_dim()
    }

    fn contact_ids(&self) -> &[usize] {
        self.inner.contact_ids()
    }
}

impl<T: Scalar, M: ContactModel<T>> ContactModel<T> for CountingModel<M> {
    fn position(&self, contact: usize, state: &[T]) -> [T; 3] {
        ContactModel::<T>::position(&self.inner, contact, state)
    }

    fn rotation(&self, contact: usize, state: &[T]) -> [[T; 3]; 3] {
        ContactModel::<T>::rotation(&self.inner, contact, state)
    }

    fn twist(&self, contact: usize, state: &[T], input: &[T]) -> [T; 6] {
        self.twist_calls.fetch_add(1, Ordering::SeqCst);
        ContactModel::<T>::twist(&self.inner, contact, state, input)
    }

    fn acceleration(&self, contact: usize, state: &[T], input: &[T]) -> [T; 6] {
        ContactModel::<T>::acceleration(&self.inner, contact, state, input)
    }
}

/// Central-difference Jacobians of `f` w.r.t. state and input.
pub fn finite_difference(
    state: &DVector<f64>,
    input: &DVector<f64>,
    f: impl Fn(&DVector<f64>, &DVector<f64>) -> DVector<f64>,
) -> (DMatrix<f64>, DMatrix<f64>) {
    let h = 1e-6;
    let rows = f(state, input).len();
    let mut dfdx = DMatrix::zeros(rows, state.len());
    let mut dfdu = DMatrix::zeros(rows, input.len());

    let mut perturbed = state.clone();
    for j in 0..state.len() {
        perturbed[j] = state[j] + h;
        let plus = f(&perturbed, input);
        perturbed[j] = state[j] - h;
        let minus = f(&perturbed, input);
        perturbed[j] = state[j];
        dfdx.set_column(j, &((plus - minus) / (2.0 * h)));
    }

    let mut perturbed = input.clone();
    for j in 0..input.len() {
        perturbed[j] = input[j] + h;
        let plus = f(state, &perturbed);
        perturbed[j] = input[j] - h;
        let minus = f(state, &perturbed);
        perturbed[j] = input[j];
        dfdu.set_column(j, &((plus - minus) / (2.0 * h)));
    }

    (dfdx, dfdu)
}

pub fn assert_close(a: &DMatrix<f64>, b: &DMatrix<f64>, tol: f64) {
    assert_eq!(a.shape(), b.shape());
    let diff = (a - b).amax();
    assert!(diff < tol, "max deviation {diff}\n{a}\n{b}");
}
