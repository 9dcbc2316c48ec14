pub mod constraint;
pub mod controller_message;
pub mod error;
pub mod force;
pub mod ode;
pub mod particle;
pub mod pworld;
pub mod solver;
pub mod time_manager;

pub type V2 = nalgebra::Vector2<f64>;
