use nalgebra::DVector;

use crate::constraint::{Constraint, JacobianRow};
use crate::particle::ParticleSet;

pub const CG_MAX_ITER: usize = 1000;
// relative to the right-hand side norm; with stabilization gains of
// 1e4 an absolute target would sit at the f64 noise floor
pub const CG_TOLERANCE: f64 = 1e-10;

// Tikhonov term keeping J W J^T positive definite
const REGULARIZATION: f64 = 1e-6;

// Computes the constraint forces J^T lambda for the current state.
//
// Solves (J W J^T) lambda = -Jdot qdot - J W Q - ks C - kd J qdot
// without forming J W J^T, applying it row-wise as a linear operator
// inside a conjugate-gradient iteration. Returns None when the
// iteration fails to converge; the caller is expected to skip
// constraint forces for the tick instead of aborting.
pub fn constraint_forces(
	particles: &ParticleSet,
	constraints: &[Box<dyn Constraint>],
	winv: &[f64],
	stab_ks: f64,
	stab_kd: f64,
) -> Option<DVector<f64>> {
	let n2 = particles.len() * 2;
	let m = constraints.len();

	let mut qdot = DVector::zeros(n2);
	let mut ext = DVector::zeros(n2);
	for (h, p) in particles.iter() {
		let vel = p.get_vel();
		qdot[h.col_x()] = vel.x;
		qdot[h.col_y()] = vel.y;
		let f = p.force_sum();
		ext[h.col_x()] = f.x;
		ext[h.col_y()] = f.y;
	}

	let mut c = DVector::zeros(m);
	let mut jac = Vec::with_capacity(m);
	let mut jac_dot = Vec::with_capacity(m);
	for (i, con) in constraints.iter().enumerate() {
		c[i] = con.value(particles);
		let mut row = JacobianRow::default();
		con.jacobian(particles, &mut row);
		jac.push(row);
		let mut row = JacobianRow::default();
		con.jacobian_dot(particles, &mut row);
		jac_dot.push(row);
	}

	let jq = row_mul(&jac, &qdot);
	let jdotq = row_mul(&jac_dot, &qdot);
	let wq = scale_diag(winv, &ext);
	let jwq = row_mul(&jac, &wq);
	let b = -jdotq - jwq - c * stab_ks - jq * stab_kd;

	let lambda = cg(
		|x| {
			let jt_x = row_mul_transpose(&jac, x, n2);
			let w_jt_x = scale_diag(winv, &jt_x);
			row_mul(&jac, &w_jt_x) + x * REGULARIZATION
		},
		&b,
		CG_MAX_ITER,
		CG_TOLERANCE,
	)?;

	Some(row_mul_transpose(&jac, &lambda, n2))
}

// J x over sparse rows
fn row_mul(rows: &[JacobianRow], x: &DVector<f64>) -> DVector<f64> {
	DVector::from_iterator(
		rows.len(),
		rows.iter().map(|row| {
			row.entries()
				.iter()
				.map(|&(col, v)| v * x[col])
				.sum::<f64>()
		}),
	)
}

// J^T x over sparse rows
fn row_mul_transpose(rows: &[JacobianRow], x: &DVector<f64>, dim: usize) -> DVector<f64> {
	let mut out = DVector::zeros(dim);
	for (i, row) in rows.iter().enumerate() {
		for &(col, v) in row.entries() {
			out[col] += v * x[i];
		}
	}
	out
}

fn scale_diag(diag: &[f64], x: &DVector<f64>) -> DVector<f64> {
	DVector::from_iterator(x.len(), x.iter().zip(diag).map(|(v, d)| v * d))
}

// Matrix-free conjugate gradients for a symmetric positive-definite
// operator, converged when |r| <= tol * |b|. None on iteration-cap
// exhaustion or a degenerate search direction.
pub fn cg<F>(apply: F, b: &DVector<f64>, max_iter: usize, tol: f64) -> Option<DVector<f64>>
where
	F: Fn(&DVector<f64>) -> DVector<f64>,
{
	let mut x = DVector::zeros(b.len());
	let mut r = b.clone();
	let mut rr = r.dot(&r);
	if rr == 0.0 {
		return Some(x);
	}
	let threshold = tol * rr.sqrt();
	let mut p = r.clone();
	for _ in 0..max_iter {
		let ap = apply(&p);
		let pap = p.dot(&ap);
		if !pap.is_finite() || pap <= 0.0 {
			return None;
		}
		let alpha = rr / pap;
		x += &p * alpha;
		r -= ap * alpha;
		let rr_next = r.dot(&r);
		if rr_next.sqrt() <= threshold {
			return Some(x);
		}
		p = &r + &p * (rr_next / rr);
		rr = rr_next;
	}
	None
}
