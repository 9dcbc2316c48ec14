use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::time::SystemTime;

use protocol::rd_model::{RdLink, RdModel, RdParticle};
use protocol::scene::{LinkKind, SceneModel};
use protocol::user_event::{UpdateInfo, UserEvent};

use crate::constraint::{Constraint, DistanceConstraint, ImmovableConstraint};
use crate::controller_message::ControllerMessage;
use crate::error::{Error, Result};
use crate::force::{Force, Gravity, PointerForce, SpringForce, ViscousDrag, DEFAULT_GRAVITY};
use crate::ode::OdeSolver;
use crate::particle::{PHandle, Particle, ParticleSet};
use crate::solver;
use crate::time_manager::{TimeManager, TimeModel};
use crate::V2;

pub const DEFAULT_BOUNCE_KEEP: f64 = 0.9;
pub const DEFAULT_VISCOUS_DRAG: f64 = 0.01;

// Baumgarte stabilization gains pulling constraint drift back to zero
const STAB_KS: f64 = 10000.0;
const STAB_KD: f64 = 100.0;

pub struct PWorld {
	particles: ParticleSet,
	forces: Vec<Box<dyn Force>>,
	constraints: Vec<Box<dyn Constraint>>,

	gravity: Gravity,
	drag: ViscousDrag,
	pointer: PointerForce,

	solver: OdeSolver,
	size: V2,
	particle_radius: f64,
	bounce_keep: f64,
	stab_ks: f64,
	stab_kd: f64,

	// inverse-mass diagonal, rebuilt when the particle count changes
	winv: Vec<f64>,

	time_manager: TimeManager,
}

impl PWorld {
	pub fn new(size: V2, particle_radius: f64) -> Result<Self> {
		let mut world = Self {
			particles: ParticleSet::default(),
			forces: Vec::new(),
			constraints: Vec::new(),
			gravity: Gravity::new(DEFAULT_GRAVITY),
			drag: ViscousDrag::new(DEFAULT_VISCOUS_DRAG),
			pointer: PointerForce::default(),
			solver: OdeSolver::RungeKutta,
			size: V2::zeros(),
			particle_radius: 0.0,
			bounce_keep: DEFAULT_BOUNCE_KEEP,
			stab_ks: STAB_KS,
			stab_kd: STAB_KD,
			winv: Vec::new(),
			time_manager: TimeManager::default(),
		};
		world.set_size(size)?;
		world.set_particle_radius(particle_radius)?;
		Ok(world)
	}

	pub fn with_solver(mut self, solver: OdeSolver) -> Self {
		self.solver = solver;
		self
	}

	pub fn with_fixed_step(mut self, dt: f64) -> Self {
		self.time_manager = TimeManager::new(TimeModel::FixedStep(dt));
		self
	}

	pub fn add_particle(&mut self, pos: V2, mass: f64) -> Result<PHandle> {
		if !(mass > 0.0 && mass.is_finite()) {
			return Err(Error::InvalidParam(format!(
				"particle mass must be positive and finite. Provided value was {}",
				mass
			)));
		}
		Ok(self.particles.add(pos, mass))
	}

	pub fn add_force(&mut self, force: Box<dyn Force>) -> Result<()> {
		if let Some((p1, p2)) = force.endpoints() {
			for h in [p1, p2] {
				if !self.particles.contains(h) {
					return Err(Error::UnknownParticle(h.id()));
				}
			}
		}
		self.forces.push(force);
		Ok(())
	}

	pub fn add_constraint(&mut self, constraint: Box<dyn Constraint>) -> Result<()> {
		for h in constraint.anchors() {
			if !self.particles.contains(h) {
				return Err(Error::UnknownParticle(h.id()));
			}
		}
		self.constraints.push(constraint);
		Ok(())
	}

	pub fn particle(&self, h: PHandle) -> &Particle {
		self.particles.get(h)
	}

	pub fn particles(&self) -> impl Iterator<Item = (PHandle, &Particle)> {
		self.particles.iter()
	}

	pub fn forces(&self) -> impl Iterator<Item = &dyn Force> {
		self.forces.iter().map(|f| f.as_ref())
	}

	pub fn particle_len(&self) -> usize {
		self.particles.len()
	}

	pub fn constraint_len(&self) -> usize {
		self.constraints.len()
	}

	pub fn solver(&self) -> OdeSolver {
		self.solver
	}

	pub fn set_solver(&mut self, solver: OdeSolver) {
		eprintln!("INFO: using {} solver", solver.name());
		self.solver = solver;
	}

	pub fn gravity(&self) -> f64 {
		self.gravity.get_g()
	}

	pub fn set_gravity(&mut self, g: f64) {
		self.gravity.set_g(g);
	}

	pub fn drag(&self) -> f64 {
		self.drag.get_drag()
	}

	pub fn set_drag(&mut self, drag: f64) {
		self.drag.set_drag(drag);
	}

	pub fn bounce_keep(&self) -> f64 {
		self.bounce_keep
	}

	pub fn set_bounce_keep(&mut self, bounce_keep: f64) -> Result<()> {
		if bounce_keep < 0.0 {
			return Err(Error::InvalidParam(format!(
				"bounce keep can not be less than zero. Provided value was {}",
				bounce_keep
			)));
		}
		self.bounce_keep = bounce_keep;
		Ok(())
	}

	pub fn size(&self) -> V2 {
		self.size
	}

	pub fn set_size(&mut self, size: V2) -> Result<()> {
		if size.x < 0.0 {
			return Err(Error::InvalidParam(format!(
				"width can not be less than zero. Provided value was {}",
				size.x
			)));
		}
		if size.y < 0.0 {
			return Err(Error::InvalidParam(format!(
				"height can not be less than zero. Provided value was {}",
				size.y
			)));
		}
		self.size = size;
		Ok(())
	}

	pub fn particle_radius(&self) -> f64 {
		self.particle_radius
	}

	pub fn set_particle_radius(&mut self, particle_radius: f64) -> Result<()> {
		if particle_radius <= 0.0 {
			return Err(Error::InvalidParam(format!(
				"particle radius must be greater than zero. Provided value was {}",
				particle_radius
			)));
		}
		self.particle_radius = particle_radius;
		Ok(())
	}

	// restores every particle; force and constraint lists are untouched
	pub fn reset(&mut self) {
		self.particles.reset();
	}

	pub fn load_scene(&mut self, scene: &SceneModel) -> Result<()> {
		let mut handles = Vec::with_capacity(scene.particles.len());
		for sp in scene.particles.iter() {
			let h = self.add_particle(V2::new(sp.pos[0], sp.pos[1]), sp.mass)?;
			handles.push(h);
		}
		for (sp, &h) in scene.particles.iter().zip(handles.iter()) {
			if !sp.movable {
				self.add_constraint(Box::new(ImmovableConstraint::new(h)))?;
			}
		}
		for link in scene.links.iter() {
			let (p1, p2) = match (handles.get(link.p1), handles.get(link.p2)) {
				(Some(&p1), Some(&p2)) => (p1, p2),
				_ => {
					return Err(Error::InvalidParam(format!(
						"link endpoints out of range: {}-{}",
						link.p1, link.p2
					)))
				}
			};
			let rest = (self.particles.get(p2).get_pos() - self.particles.get(p1).get_pos())
				.norm();
			match link.kind {
				LinkKind::Spring { ks, kd } => {
					self.add_force(Box::new(SpringForce::new(p1, p2, rest, ks, kd)))?;
				}
				LinkKind::Stiff => {
					self.add_constraint(Box::new(DistanceConstraint::new(p1, p2, rest)))?;
					// zero-stiffness spring keeps the link visible
					self.add_force(Box::new(SpringForce::new(p1, p2, rest, 0.0, 0.0)))?;
				}
			}
		}
		eprintln!(
			"INFO: loaded scene: {} particles, {} links",
			scene.particles.len(),
			scene.links.len()
		);
		Ok(())
	}

	pub fn step(&mut self, dt: f64) {
		if dt <= 0.0 {
			return;
		}

		self.particles.clear_forces();

		self.gravity.apply(&mut self.particles);
		self.drag.apply(&mut self.particles);
		for force in self.forces.iter_mut() {
			force.apply(&mut self.particles);
		}
		self.pointer.apply(&mut self.particles);

		if !self.constraints.is_empty() {
			self.refresh_winv();
			match solver::constraint_forces(
				&self.particles,
				&self.constraints,
				&self.winv,
				self.stab_ks,
				self.stab_kd,
			) {
				Some(fc) => {
					for i in 0..self.particles.len() {
						let h = PHandle(i);
						self.particles
							.add_force(h, V2::new(fc[h.col_x()], fc[h.col_y()]));
					}
				}
				None => {
					eprintln!("WARN: constraint solve did not converge, dropping constraint forces for this tick");
				}
			}
			for constraint in self.constraints.iter_mut() {
				constraint.apply(&mut self.particles, dt);
			}
		}

		self.particles.integrate(self.solver, dt);

		let floor = self.size.y;
		for p in self.particles.iter_mut() {
			let pos = p.get_pos();
			if pos.y + self.particle_radius > floor {
				let vel = p.get_vel();
				p.set_state(
					V2::new(pos.x, floor - self.particle_radius),
					V2::new(vel.x, -vel.y * self.bounce_keep),
				);
			}
		}
	}

	fn refresh_winv(&mut self) {
		if self.winv.len() != self.particles.len() * 2 {
			self.winv = self.particles.inverse_masses();
		}
	}

	pub fn rd_model(&self) -> RdModel {
		let mut model = RdModel::default();
		for (h, p) in self.particles.iter() {
			let pos = p.get_pos();
			model.particles.insert(
				h.id(),
				RdParticle {
					pos: [pos.x, pos.y],
				},
			);
		}
		for force in self.forces.iter() {
			if let Some((p1, p2)) = force.endpoints() {
				model.links.push(RdLink {
					p1: p1.id(),
					p2: p2.id(),
				});
			}
		}
		model
	}

	pub fn apply_message(&mut self, msg: ControllerMessage) {
		use ControllerMessage::*;
		let result = match msg {
			SetSolver(solver) => {
				self.set_solver(solver);
				Ok(())
			}
			Reset => {
				self.reset();
				Ok(())
			}
			SetGravity(g) => {
				self.set_gravity(g);
				Ok(())
			}
			SetDrag(drag) => {
				self.set_drag(drag);
				Ok(())
			}
			SetBounceKeep(k) => self.set_bounce_keep(k),
			SetWorldSize(size) => self.set_size(V2::new(size[0], size[1])),
			SetParticleRadius(r) => self.set_particle_radius(r),
			PointerPick(at) => {
				self.pointer.pick(&self.particles, V2::new(at[0], at[1]));
				Ok(())
			}
			PointerDrag(at) => {
				self.pointer.drag(V2::new(at[0], at[1]));
				Ok(())
			}
			PointerRelease => {
				self.pointer.release();
				Ok(())
			}
		};
		if let Err(e) = result {
			eprintln!("WARN: rejected command: {}", e);
		}
	}

	// dedicated simulation loop: drain commands, step with wall-clock
	// dt, publish a frame; exits when either channel disconnects
	pub fn run_thread(&mut self, tx: Sender<UserEvent>, rx: Receiver<ControllerMessage>) {
		self.time_manager.rearm();
		loop {
			loop {
				match rx.try_recv() {
					Ok(msg) => self.apply_message(msg),
					Err(TryRecvError::Empty) => break,
					Err(TryRecvError::Disconnected) => return,
				}
			}

			let dt = self.time_manager.take_time();
			let start = SystemTime::now();
			self.step(dt);
			let spent = start.elapsed().unwrap_or_default().as_secs_f64();

			let model = self.rd_model();
			let info = UpdateInfo {
				load: if dt > 0.0 { spent / dt } else { 0.0 },
				particle_len: model.particles.len(),
				link_len: model.links.len(),
			};
			if tx.send(UserEvent::Update(model, info)).is_err() {
				return;
			}
		}
	}
}
