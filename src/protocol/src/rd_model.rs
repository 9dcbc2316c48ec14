// rd_model: read-only snapshot of the system for rendering

use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct RdParticle {
	pub pos: [f64; 2],
}

// endpoints are particle ids; only forces with endpoints become links
#[derive(Clone, Debug)]
pub struct RdLink {
	pub p1: usize,
	pub p2: usize,
}

#[derive(Clone, Debug, Default)]
pub struct RdModel {
	pub particles: HashMap<usize, RdParticle>,
	pub links: Vec<RdLink>,
}
