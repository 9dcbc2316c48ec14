use crate::force::{Force, MIN_LENGTH};
use crate::particle::{PHandle, ParticleSet};

pub struct SpringForce {
	p1: PHandle,
	p2: PHandle,
	rest_length: f64,
	ks: f64,
	kd: f64,
}

impl SpringForce {
	pub fn new(p1: PHandle, p2: PHandle, rest_length: f64, ks: f64, kd: f64) -> Self {
		Self {
			p1,
			p2,
			rest_length,
			ks,
			kd,
		}
	}

	pub fn rest_length(&self) -> f64 {
		self.rest_length
	}
}

impl Force for SpringForce {
	fn apply(&mut self, particles: &mut ParticleSet) {
		let pa = particles.get(self.p1);
		let pb = particles.get(self.p2);

		let l = pa.get_pos() - pb.get_pos();
		let dl = pa.get_vel() - pb.get_vel();
		let len = l.norm();
		if len < MIN_LENGTH {
			return;
		}

		let magnitude_spring = (len - self.rest_length) * self.ks;
		let magnitude_damping = dl.dot(&l) * self.kd / len;
		let f = l / len * (magnitude_spring + magnitude_damping);

		particles.add_force(self.p2, f);
		particles.add_force(self.p1, -f);
	}

	fn endpoints(&self) -> Option<(PHandle, PHandle)> {
		Some((self.p1, self.p2))
	}
}
