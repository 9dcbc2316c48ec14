use crate::ode::{OdeSolver, PointMass, PState};
use crate::V2;

// stable index into the owning set; doubles as the particle's
// row block in the flattened constraint matrices
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PHandle(pub(crate) usize);

impl PHandle {
	pub fn id(&self) -> usize {
		self.0
	}

	pub(crate) fn col_x(&self) -> usize {
		self.0 * 2
	}

	pub(crate) fn col_y(&self) -> usize {
		self.0 * 2 + 1
	}
}

#[derive(Clone, Debug)]
pub struct Particle {
	start_pos: V2,
	pos: V2,
	vel: V2,
	mass: f64,
	force: V2,
}

impl Particle {
	pub(crate) fn new(pos: V2, mass: f64) -> Self {
		Self {
			start_pos: pos,
			pos,
			vel: V2::zeros(),
			mass,
			force: V2::zeros(),
		}
	}

	pub fn get_pos(&self) -> V2 {
		self.pos
	}

	pub fn get_vel(&self) -> V2 {
		self.vel
	}

	pub fn get_mass(&self) -> f64 {
		self.mass
	}

	pub fn force_sum(&self) -> V2 {
		self.force
	}

	pub(crate) fn add_force(&mut self, f: V2) {
		self.force += f;
	}

	pub(crate) fn clear_forces(&mut self) {
		self.force = V2::zeros();
	}

	pub(crate) fn set_state(&mut self, pos: V2, vel: V2) {
		self.pos = pos;
		self.vel = vel;
	}

	pub(crate) fn reset(&mut self) {
		self.pos = self.start_pos;
		self.vel = V2::zeros();
		self.force = V2::zeros();
	}

	fn integrate(&mut self, solver: OdeSolver, dt: f64) {
		let ode = PointMass {
			accel: self.force / self.mass,
		};
		let state = PState {
			pos: self.pos,
			vel: self.vel,
		};
		let next = solver.step(&ode, state, dt);
		self.pos = next.pos;
		self.vel = next.vel;
	}
}

// arena owning every particle of a system; handles are assigned on
// add and stay valid for the lifetime of the set (count only grows)
#[derive(Default)]
pub struct ParticleSet {
	data: Vec<Particle>,
}

impl ParticleSet {
	pub fn add(&mut self, pos: V2, mass: f64) -> PHandle {
		self.data.push(Particle::new(pos, mass));
		PHandle(self.data.len() - 1)
	}

	pub fn len(&self) -> usize {
		self.data.len()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	pub fn contains(&self, h: PHandle) -> bool {
		h.0 < self.data.len()
	}

	pub fn get(&self, h: PHandle) -> &Particle {
		&self.data[h.0]
	}

	pub fn iter(&self) -> impl Iterator<Item = (PHandle, &Particle)> {
		self.data.iter().enumerate().map(|(i, p)| (PHandle(i), p))
	}

	pub(crate) fn get_mut(&mut self, h: PHandle) -> &mut Particle {
		&mut self.data[h.0]
	}

	pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Particle> {
		self.data.iter_mut()
	}

	pub(crate) fn add_force(&mut self, h: PHandle, f: V2) {
		self.data[h.0].add_force(f);
	}

	pub(crate) fn clear_forces(&mut self) {
		for p in self.data.iter_mut() {
			p.clear_forces();
		}
	}

	pub(crate) fn reset(&mut self) {
		for p in self.data.iter_mut() {
			p.reset();
		}
	}

	// 1/mass replicated per coordinate, the W diagonal of the solve
	pub(crate) fn inverse_masses(&self) -> Vec<f64> {
		let mut winv = Vec::with_capacity(self.data.len() * 2);
		for p in self.data.iter() {
			winv.push(1.0 / p.mass);
			winv.push(1.0 / p.mass);
		}
		winv
	}

	#[cfg(not(debug_assertions))]
	pub(crate) fn integrate(&mut self, solver: OdeSolver, dt: f64) {
		use rayon::prelude::*;
		self.data
			.par_iter_mut()
			.for_each(|p| p.integrate(solver, dt));
	}

	#[cfg(debug_assertions)]
	pub(crate) fn integrate(&mut self, solver: OdeSolver, dt: f64) {
		self.data.iter_mut().for_each(|p| p.integrate(solver, dt));
	}
}
