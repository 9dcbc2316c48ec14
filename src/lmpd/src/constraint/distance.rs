use crate::constraint::{Constraint, JacobianRow};
use crate::particle::{PHandle, ParticleSet};

pub struct DistanceConstraint {
	p1: PHandle,
	p2: PHandle,
	distance: f64,
}

impl DistanceConstraint {
	pub fn new(p1: PHandle, p2: PHandle, distance: f64) -> Self {
		Self { p1, p2, distance }
	}

	pub fn distance(&self) -> f64 {
		self.distance
	}
}

impl Constraint for DistanceConstraint {
	// C = (d . d - r^2) / 2 with d = p2 - p1
	fn value(&self, particles: &ParticleSet) -> f64 {
		let diff = particles.get(self.p2).get_pos() - particles.get(self.p1).get_pos();
		(diff.dot(&diff) - self.distance * self.distance) / 2.0
	}

	fn jacobian(&self, particles: &ParticleSet, row: &mut JacobianRow) {
		let diff = particles.get(self.p1).get_pos() - particles.get(self.p2).get_pos();
		row.push(self.p1.col_x(), diff.x);
		row.push(self.p1.col_y(), diff.y);
		row.push(self.p2.col_x(), -diff.x);
		row.push(self.p2.col_y(), -diff.y);
	}

	fn jacobian_dot(&self, particles: &ParticleSet, row: &mut JacobianRow) {
		let diff = particles.get(self.p1).get_vel() - particles.get(self.p2).get_vel();
		row.push(self.p1.col_x(), diff.x);
		row.push(self.p1.col_y(), diff.y);
		row.push(self.p2.col_x(), -diff.x);
		row.push(self.p2.col_y(), -diff.y);
	}

	fn anchors(&self) -> Vec<PHandle> {
		vec![self.p1, self.p2]
	}
}
