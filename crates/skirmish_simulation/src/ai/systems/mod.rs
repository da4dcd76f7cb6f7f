//! AI systems (strategic layer logic)

pub mod attack;
pub mod fsm;
pub mod movement;
pub mod perception;

// Re-export all systems
pub use attack::*;
pub use fsm::*;
pub use movement::*;
pub use perception::*;
