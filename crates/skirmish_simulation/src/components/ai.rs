//! AI компоненты: state machine, config, память о цели

// NOTE: компоненты AI живут в crate::ai::components (рядом с системами).
// Экспортируем здесь для единообразия импортов.

pub use crate::ai::{
    AiConfig, AiState, AiTarget, DecisionClock, PatrolRoute, TargetMemory,
};
