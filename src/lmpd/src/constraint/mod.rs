mod distance;
mod immovable;

pub use distance::DistanceConstraint;
pub use immovable::ImmovableConstraint;

use crate::particle::{PHandle, ParticleSet};

// one sparse row over the flattened 2n-dimensional position space
#[derive(Clone, Debug, Default)]
pub struct JacobianRow {
	entries: Vec<(usize, f64)>,
}

impl JacobianRow {
	pub fn push(&mut self, col: usize, value: f64) {
		self.entries.push((col, value));
	}

	pub fn entries(&self) -> &[(usize, f64)] {
		&self.entries
	}
}

// one scalar equation C = 0 with its Jacobian row and the row's
// time derivative
pub trait Constraint: Send {
	fn value(&self, particles: &ParticleSet) -> f64;

	fn jacobian(&self, particles: &ParticleSet, row: &mut JacobianRow);

	fn jacobian_dot(&self, particles: &ParticleSet, row: &mut JacobianRow);

	// side effects outside the linear system, run after the solve
	fn apply(&mut self, _particles: &mut ParticleSet, _dt: f64) {}

	// handles this constraint references, for membership validation
	fn anchors(&self) -> Vec<PHandle>;
}
