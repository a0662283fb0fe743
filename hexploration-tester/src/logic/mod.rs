pub mod policy;
pub mod reports;
pub mod simulation;
pub mod tester;

pub use policy::{DecisionPolicy, GameplayStrategy};
pub use simulation::{Simulation, SimulationSummary};
pub use tester::*;
