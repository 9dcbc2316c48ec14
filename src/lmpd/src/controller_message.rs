use crate::ode::OdeSolver;

// configuration and interaction commands from the UI thread,
// drained by the simulation loop once per tick, in order
pub enum ControllerMessage {
	SetSolver(OdeSolver),
	Reset,
	SetGravity(f64),
	SetDrag(f64),
	SetBounceKeep(f64),
	SetWorldSize([f64; 2]),
	SetParticleRadius(f64),
	PointerPick([f64; 2]),
	PointerDrag([f64; 2]),
	PointerRelease,
}
