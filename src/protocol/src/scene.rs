// scene: editor-side description of a system before it is loaded
// into the engine. Link endpoints are indices into `particles`.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SceneParticle {
	pub pos: [f64; 2],
	pub mass: f64,
	pub movable: bool,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub enum LinkKind {
	Spring { ks: f64, kd: f64 },
	Stiff,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SceneLink {
	pub p1: usize,
	pub p2: usize,
	pub kind: LinkKind,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SceneModel {
	pub particles: Vec<SceneParticle>,
	pub links: Vec<SceneLink>,
}

impl SceneModel {
	pub fn push_particle(&mut self, pos: [f64; 2], mass: f64, movable: bool) -> usize {
		self.particles.push(SceneParticle { pos, mass, movable });
		self.particles.len() - 1
	}

	pub fn push_link(&mut self, p1: usize, p2: usize, kind: LinkKind) {
		self.links.push(SceneLink { p1, p2, kind });
	}
}
