use crate::constraint::{Constraint, JacobianRow};
use crate::particle::{PHandle, ParticleSet};

// pins a particle by wiping whatever the force pass and the solve
// accumulated on it; contributes an empty row to the system
pub struct ImmovableConstraint {
	p: PHandle,
}

impl ImmovableConstraint {
	pub fn new(p: PHandle) -> Self {
		Self { p }
	}
}

impl Constraint for ImmovableConstraint {
	fn value(&self, _particles: &ParticleSet) -> f64 {
		0.0
	}

	fn jacobian(&self, _particles: &ParticleSet, _row: &mut JacobianRow) {}

	fn jacobian_dot(&self, _particles: &ParticleSet, _row: &mut JacobianRow) {}

	fn apply(&mut self, particles: &mut ParticleSet, _dt: f64) {
		particles.get_mut(self.p).clear_forces();
	}

	fn anchors(&self) -> Vec<PHandle> {
		vec![self.p]
	}
}
