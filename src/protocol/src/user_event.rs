use crate::rd_model::RdModel;

#[derive(Debug)]
pub enum UserEvent {
	Update(RdModel, UpdateInfo),
}

#[derive(Debug)]
pub struct UpdateInfo {
	// wall time spent on the step / simulated time
	pub load: f64,
	pub particle_len: usize,
	pub link_len: usize,
}
