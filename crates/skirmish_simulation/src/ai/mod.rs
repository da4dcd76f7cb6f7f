//! AI decision-making module
//!
//! Пятисостоянийный FSM (Idle/Patrol/Chase/Attack/Search) поверх
//! perception'а (sight cone + LOS) и navigation boundary.
//!
//! Порядок выполнения (SimSet):
//! 1. Perception — acquire_targets, update_perception
//! 2. Decision — ai_decision_tick (FSM transitions, раз в decision_interval)
//! 3. Behavior — ai_movement_from_state, ai_attack_execution

use bevy::prelude::*;

pub mod components;
pub mod perception;
pub mod systems;

// Re-export основных типов
pub use components::*;

use crate::SimSet;

/// AI Plugin
///
/// Регистрирует AI системы в FixedUpdate; внутри фаз — chain для
/// детерминизма.
pub struct AiPlugin;

impl Plugin for AiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (systems::acquire_targets, systems::update_perception)
                .chain()
                .in_set(SimSet::Perception),
        )
        .add_systems(FixedUpdate, systems::ai_decision_tick.in_set(SimSet::Decision))
        .add_systems(
            FixedUpdate,
            (systems::ai_movement_from_state, systems::ai_attack_execution)
                .chain()
                .in_set(SimSet::Behavior),
        );
    }
}
