//! ECS Components для игровых entity
//!
//! Организация по доменам:
//! - actor: базовые характеристики (faction, role, health)
//! - movement: навигация и перемещение (MovementCommand, MovementInput)
//! - ai: искусственный интеллект (AiState, AiConfig, PatrolRoute, ...)
//! - combat: оружие и щит (Loadout, EquippedWeapon, Shield)

pub mod actor;
pub mod movement;

pub mod ai;
pub mod combat;

// Re-exports для удобного импорта
pub use actor::*;
pub use ai::*;
pub use combat::*;
pub use movement::*;
