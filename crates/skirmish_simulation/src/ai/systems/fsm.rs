//! FSM AI system: state transitions на decision tick'ах.
//!
//! Переоценка состояния идёт не каждый кадр, а раз в decision_interval
//! (default 0.25s) — perception и так обновляется каждый тик, но
//! решения дешевле принимать реже. Поведение активного состояния при
//! этом исполняется каждый тик (ai/systems/movement.rs, attack.rs).

use bevy::prelude::*;

use crate::ai::{AiConfig, AiState, AiTarget, DecisionClock, PatrolRoute, TargetMemory};

/// Снимок входов решения на момент decision tick'а
struct DecisionInputs {
    /// Видна ли цель прямо сейчас
    visible: bool,
    /// Дистанция до цели (INFINITY если цели нет)
    distance: f32,
    /// Секунды с последнего контакта
    time_since_seen: f32,
    /// Дистанция до last seen позиции (INFINITY если контакта не было)
    distance_to_last_seen: f32,
    /// Есть ли непустой patrol маршрут
    has_patrol: bool,
}

/// Таблица переходов. Условия проверяются сверху вниз, первое
/// сработавшее побеждает. Гистерезис Attack→Chase задаёт
/// chase_reentry_factor.
fn next_state(current: AiState, inputs: &DecisionInputs, config: &AiConfig) -> AiState {
    match current {
        AiState::Idle | AiState::Patrol => {
            if inputs.visible && inputs.distance <= config.chase_range {
                if inputs.distance <= config.shoot_range {
                    AiState::Attack
                } else {
                    AiState::Chase
                }
            } else if current == AiState::Idle && inputs.has_patrol {
                AiState::Patrol
            } else {
                current
            }
        }

        AiState::Chase => {
            if !inputs.visible && inputs.time_since_seen > config.lose_target_time {
                AiState::Search
            } else if inputs.visible && inputs.distance <= config.shoot_range {
                AiState::Attack
            } else {
                AiState::Chase
            }
        }

        AiState::Attack => {
            if !inputs.visible && inputs.time_since_seen > config.lose_target_time {
                AiState::Search
            } else if inputs.distance > config.chase_range {
                // Совсем потеряли — назад в patrol/idle
                if inputs.has_patrol {
                    AiState::Patrol
                } else {
                    AiState::Idle
                }
            } else if inputs.visible
                && inputs.distance > config.shoot_range * config.chase_reentry_factor
            {
                AiState::Chase
            } else {
                AiState::Attack
            }
        }

        AiState::Search => {
            if inputs.visible {
                if inputs.distance <= config.shoot_range {
                    AiState::Attack
                } else {
                    AiState::Chase
                }
            } else if inputs.distance_to_last_seen < config.search_arrive_radius {
                // Дошли до last seen, цели нет
                if inputs.has_patrol {
                    AiState::Patrol
                } else {
                    AiState::Idle
                }
            } else {
                AiState::Search
            }
        }
    }
}

/// Система: decision tick → FSM transition
pub fn ai_decision_tick(
    mut agents: Query<(
        Entity,
        &Transform,
        &AiConfig,
        &AiTarget,
        &TargetMemory,
        Option<&PatrolRoute>,
        &mut DecisionClock,
        &mut AiState,
    )>,
    targets: Query<&Transform>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, transform, config, target, memory, route, mut clock, mut state) in
        agents.iter_mut()
    {
        clock.timer -= delta;
        if clock.timer > 0.0 {
            continue;
        }
        clock.timer = config.decision_interval;

        let distance = target
            .entity
            .and_then(|e| targets.get(e).ok())
            .map(|t| transform.translation.distance(t.translation))
            .unwrap_or(f32::INFINITY);

        let distance_to_last_seen = if memory.time_since_seen.is_finite() {
            transform.translation.distance(memory.last_seen_position)
        } else {
            f32::INFINITY
        };

        let inputs = DecisionInputs {
            visible: memory.visible,
            distance,
            time_since_seen: memory.time_since_seen,
            distance_to_last_seen,
            has_patrol: route.map_or(false, |r| !r.is_empty()),
        };

        let new_state = next_state(*state, &inputs, config);

        if *state != new_state {
            crate::logger::log(&format!(
                "AI: {:?} {:?} → {:?} (dist {:.1}, visible {})",
                entity, *state, new_state, distance, memory.visible
            ));
            *state = new_state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(visible: bool, distance: f32) -> DecisionInputs {
        DecisionInputs {
            visible,
            distance,
            time_since_seen: if visible { 0.0 } else { f32::INFINITY },
            distance_to_last_seen: f32::INFINITY,
            has_patrol: false,
        }
    }

    #[test]
    fn test_idle_to_attack_within_shoot_range() {
        let config = AiConfig::default();
        // Цель на shoot_range - 1, видима → Attack за один tick
        let state = next_state(AiState::Idle, &inputs(true, config.shoot_range - 1.0), &config);
        assert_eq!(state, AiState::Attack);
    }

    #[test]
    fn test_idle_to_chase_outside_shoot_range() {
        let config = AiConfig::default();
        let state = next_state(AiState::Idle, &inputs(true, 20.0), &config);
        assert_eq!(state, AiState::Chase);
    }

    #[test]
    fn test_idle_to_patrol_with_route() {
        let config = AiConfig::default();
        let mut i = inputs(false, f32::INFINITY);
        i.has_patrol = true;
        assert_eq!(next_state(AiState::Idle, &i, &config), AiState::Patrol);

        // Без маршрута остаёмся в Idle
        let i = inputs(false, f32::INFINITY);
        assert_eq!(next_state(AiState::Idle, &i, &config), AiState::Idle);
    }

    #[test]
    fn test_patrol_spots_target() {
        let config = AiConfig::default();
        let mut i = inputs(true, 8.0);
        i.has_patrol = true;
        assert_eq!(next_state(AiState::Patrol, &i, &config), AiState::Attack);
    }

    #[test]
    fn test_chase_to_search_after_lose_time() {
        let config = AiConfig::default();
        let mut i = inputs(false, 15.0);

        // Ещё не прошло lose_target_time — остаёмся в Chase
        i.time_since_seen = config.lose_target_time - 0.1;
        i.distance_to_last_seen = 10.0;
        assert_eq!(next_state(AiState::Chase, &i, &config), AiState::Chase);

        i.time_since_seen = config.lose_target_time + 0.1;
        assert_eq!(next_state(AiState::Chase, &i, &config), AiState::Search);
    }

    #[test]
    fn test_attack_chase_hysteresis() {
        let config = AiConfig::default();

        // Дистанция в зазоре (shoot_range, shoot_range×1.1] — Attack держится
        let boundary = inputs(true, config.shoot_range * 1.05);
        assert_eq!(next_state(AiState::Attack, &boundary, &config), AiState::Attack);

        // Идемпотентность: повторные тики с той же дистанцией не осциллируют
        let mut state = AiState::Attack;
        for _ in 0..10 {
            state = next_state(state, &boundary, &config);
            assert_eq!(state, AiState::Attack);
        }

        // За порогом гистерезиса — Chase
        let beyond = inputs(true, config.shoot_range * config.chase_reentry_factor + 0.1);
        assert_eq!(next_state(AiState::Attack, &beyond, &config), AiState::Chase);
    }

    #[test]
    fn test_attack_falls_back_when_target_far() {
        let config = AiConfig::default();
        let i = inputs(false, config.chase_range + 5.0);
        // time_since_seen = INFINITY → Search побеждает (первое условие)
        assert_eq!(next_state(AiState::Attack, &i, &config), AiState::Search);

        // Цель видима но за chase_range → Idle (нет маршрута)
        let mut i = inputs(true, config.chase_range + 5.0);
        assert_eq!(next_state(AiState::Attack, &i, &config), AiState::Idle);

        // ...или Patrol (маршрут есть)
        i.has_patrol = true;
        assert_eq!(next_state(AiState::Attack, &i, &config), AiState::Patrol);
    }

    #[test]
    fn test_search_exit_requires_arrival_and_no_contact() {
        let config = AiConfig::default();

        // Не дошли до last seen — остаёмся в Search
        let mut i = inputs(false, f32::INFINITY);
        i.time_since_seen = 5.0;
        i.distance_to_last_seen = config.search_arrive_radius + 0.5;
        assert_eq!(next_state(AiState::Search, &i, &config), AiState::Search);

        // Дошли, но цель видна → не Patrol, а Attack/Chase
        let mut seen = inputs(true, 8.0);
        seen.distance_to_last_seen = 0.3;
        assert_eq!(next_state(AiState::Search, &seen, &config), AiState::Attack);

        let mut seen_far = inputs(true, 15.0);
        seen_far.distance_to_last_seen = 0.3;
        assert_eq!(next_state(AiState::Search, &seen_far, &config), AiState::Chase);

        // Дошли и цели нет → Idle / Patrol
        i.distance_to_last_seen = 0.3;
        assert_eq!(next_state(AiState::Search, &i, &config), AiState::Idle);
        i.has_patrol = true;
        assert_eq!(next_state(AiState::Search, &i, &config), AiState::Patrol);
    }

    #[test]
    fn test_exactly_one_state_after_any_transition() {
        // Перебор состояний × характерных входов: результат всегда
        // один из пяти легальных вариантов (enum это гарантирует,
        // тест фиксирует отсутствие panic путей)
        let config = AiConfig::default();
        let states = [
            AiState::Idle,
            AiState::Patrol,
            AiState::Chase,
            AiState::Attack,
            AiState::Search,
        ];
        let distances = [0.5, 2.0, 11.0, 12.5, 13.5, 24.0, 30.0, f32::INFINITY];

        for &state in &states {
            for &distance in &distances {
                for visible in [false, true] {
                    for has_patrol in [false, true] {
                        let mut i = inputs(visible, distance);
                        i.has_patrol = has_patrol;
                        i.distance_to_last_seen = distance;
                        let next = next_state(state, &i, &config);
                        assert!(states.contains(&next));
                    }
                }
            }
        }
    }
}
