use std::time::{Duration, SystemTime};

pub enum TimeModel {
	// fixed quantum per tick, no pacing
	FixedStep(f64),
	// measured wall-clock dt, sleeping up to the frame budget
	RealTime { min_frame: f64 },
}

pub struct TimeManager {
	model: TimeModel,
	last: SystemTime,
}

impl Default for TimeManager {
	fn default() -> Self {
		Self::new(TimeModel::RealTime { min_frame: 0.005 })
	}
}

impl TimeManager {
	pub fn new(model: TimeModel) -> Self {
		Self {
			model,
			last: SystemTime::now(),
		}
	}

	// forget time spent before the simulation loop starts, so the
	// first tick does not integrate the whole setup gap
	pub fn rearm(&mut self) {
		self.last = SystemTime::now();
	}

	pub fn take_time(&mut self) -> f64 {
		match self.model {
			TimeModel::FixedStep(dt) => {
				self.last = SystemTime::now();
				dt
			}
			TimeModel::RealTime { min_frame } => {
				let passed = self.last.elapsed().unwrap_or_default().as_secs_f64();
				if passed < min_frame {
					std::thread::sleep(Duration::from_secs_f64(min_frame - passed));
				}
				let now = SystemTime::now();
				let dt = now
					.duration_since(self.last)
					.unwrap_or_default()
					.as_secs_f64();
				self.last = now;
				dt
			}
		}
	}
}
