mod pointer;
mod spring;

pub use pointer::PointerForce;
pub use spring::SpringForce;

use crate::particle::{PHandle, ParticleSet};
use crate::V2;

pub const DEFAULT_GRAVITY: f64 = 9.82;

// below this separation a spring direction is undefined and the
// contribution is skipped
pub(crate) const MIN_LENGTH: f64 = 1e-9;

pub trait Force: Send {
	fn apply(&mut self, particles: &mut ParticleSet);

	// endpoint handles, set for forces that are drawn as links
	fn endpoints(&self) -> Option<(PHandle, PHandle)> {
		None
	}
}

// positive g points toward larger y, which is down in screen space
pub struct Gravity {
	g: f64,
}

impl Gravity {
	pub fn new(g: f64) -> Self {
		Self { g }
	}

	pub fn get_g(&self) -> f64 {
		self.g
	}

	pub fn set_g(&mut self, g: f64) {
		self.g = g;
	}
}

impl Force for Gravity {
	fn apply(&mut self, particles: &mut ParticleSet) {
		for p in particles.iter_mut() {
			let f = V2::new(0.0, p.get_mass() * self.g);
			p.add_force(f);
		}
	}
}

pub struct ViscousDrag {
	drag: f64,
}

impl ViscousDrag {
	pub fn new(drag: f64) -> Self {
		Self { drag }
	}

	pub fn get_drag(&self) -> f64 {
		self.drag
	}

	pub fn set_drag(&mut self, drag: f64) {
		self.drag = drag;
	}
}

impl Force for ViscousDrag {
	fn apply(&mut self, particles: &mut ParticleSet) {
		for p in particles.iter_mut() {
			let f = p.get_vel() * -self.drag;
			p.add_force(f);
		}
	}
}
