//! Tests for FSM AI components.

#[cfg(test)]
mod tests {
    use super::super::fsm::{AiConfig, AiState, PatrolRoute, TargetMemory};
    use bevy::prelude::*;

    #[test]
    fn test_ai_state_default() {
        let state = AiState::default();
        assert!(matches!(state, AiState::Idle));
    }

    #[test]
    fn test_ai_config_default() {
        let config = AiConfig::default();
        assert_eq!(config.chase_range, 25.0);
        assert_eq!(config.melee_range, 2.5);
        assert_eq!(config.shoot_range, 12.0);
        assert_eq!(config.decision_interval, 0.25);
        assert_eq!(config.lose_target_time, 3.0);
        assert_eq!(config.chase_reentry_factor, 1.1);
        assert_eq!(config.search_arrive_radius, 1.0);
        assert_eq!(config.facing_tolerance, 25.0);
    }

    #[test]
    fn test_target_memory_starts_unseen() {
        let memory = TargetMemory::default();
        assert!(!memory.visible);
        assert!(memory.time_since_seen.is_infinite());
    }

    #[test]
    fn test_patrol_route_cycles() {
        let mut route = PatrolRoute::new(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 10.0),
        ]);

        assert_eq!(route.current(), Some(Vec3::ZERO));
        route.advance();
        assert_eq!(route.current(), Some(Vec3::new(10.0, 0.0, 0.0)));
        route.advance();
        route.advance();
        // Цикл замкнулся
        assert_eq!(route.current(), Some(Vec3::ZERO));
    }

    #[test]
    fn test_patrol_route_empty() {
        let mut route = PatrolRoute::default();
        assert!(route.is_empty());
        assert_eq!(route.current(), None);
        route.advance(); // Не паникует
    }
}
