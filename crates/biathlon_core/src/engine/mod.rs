pub mod simulation;
pub mod transition;


pub use simulation::Simulation;
pub use transition::{Anomaly, Transition, Warning};
