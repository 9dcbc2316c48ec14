use crate::force::{Force, MIN_LENGTH};
use crate::particle::{PHandle, ParticleSet};
use crate::V2;

const PICK_RADIUS: f64 = 0.2;
const GRAB_KS: f64 = 10000.0;
const GRAB_KD: f64 = 100.0;

struct Grab {
	picked: PHandle,
	target: V2,
	rest_length: f64,
}

// interactive grab: a spring-damper between the picked particle and
// a motionless anchor at the pointer position; the anchor is not a
// system particle and the grab is never rendered
#[derive(Default)]
pub struct PointerForce {
	grab: Option<Grab>,
}

impl PointerForce {
	pub fn pick(&mut self, particles: &ParticleSet, at: V2) {
		for (h, p) in particles.iter() {
			let diff = at - p.get_pos();
			if diff.norm() <= PICK_RADIUS {
				self.grab = Some(Grab {
					picked: h,
					target: at,
					rest_length: diff.norm(),
				});
				return;
			}
		}
	}

	pub fn drag(&mut self, at: V2) {
		if let Some(grab) = self.grab.as_mut() {
			grab.target = at;
		}
	}

	pub fn release(&mut self) {
		self.grab = None;
	}

	pub fn picked(&self) -> Option<PHandle> {
		self.grab.as_ref().map(|g| g.picked)
	}
}

impl Force for PointerForce {
	fn apply(&mut self, particles: &mut ParticleSet) {
		let grab = match self.grab.as_ref() {
			Some(grab) => grab,
			None => return,
		};
		let p = particles.get(grab.picked);

		let l = p.get_pos() - grab.target;
		let dl = p.get_vel();
		let len = l.norm();
		if len < MIN_LENGTH {
			return;
		}

		let magnitude_spring = (len - grab.rest_length) * GRAB_KS;
		let magnitude_damping = dl.dot(&l) * GRAB_KD / len;
		let f = l / len * (magnitude_spring + magnitude_damping);

		particles.add_force(grab.picked, -f);
	}
}
