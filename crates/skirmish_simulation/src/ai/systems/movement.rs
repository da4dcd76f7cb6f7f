//! AI state behaviors → MovementCommand.
//!
//! Исполняется каждый тик для активного состояния (transitions — только
//! на decision tick). Attack state сюда не попадает: там навигация
//! выключена и актор рулит вручную (ai/systems/attack.rs).

use bevy::prelude::*;

use crate::ai::{AiConfig, AiState, AiTarget, PatrolRoute, TargetMemory};
use crate::combat::{switch_weapon, EquippedWeapon, WeaponKind, WeaponSwitched};
use crate::components::{Actor, MovementCommand, MovementInput, Role};
use crate::round::Bomb;

/// Горизонтальная дистанция (Y игнорируется)
fn flat_distance(a: Vec3, b: Vec3) -> f32 {
    Vec2::new(a.x - b.x, a.z - b.z).length()
}

/// Система: поведение активного состояния.
///
/// Пишет MovementCommand (+ sprint, + пре-выбор оружия в Chase).
/// Objective приоритет: defender при активной бомбе бежит к ней,
/// а не к цели.
pub fn ai_movement_from_state(
    mut agents: Query<(
        Entity,
        &Actor,
        &AiState,
        &AiConfig,
        &AiTarget,
        &TargetMemory,
        &Transform,
        Option<&mut PatrolRoute>,
        &mut MovementCommand,
        &mut MovementInput,
        &mut EquippedWeapon,
    )>,
    targets: Query<&Transform, With<Actor>>,
    bombs: Query<&Transform, With<Bomb>>,
    mut weapon_events: EventWriter<WeaponSwitched>,
) {
    // Активная бомба (максимум одна за раунд)
    let bomb_position = bombs.iter().next().map(|t| t.translation);

    for (
        entity,
        actor,
        state,
        config,
        target,
        memory,
        transform,
        route,
        mut command,
        mut input,
        mut equipped,
    ) in agents.iter_mut()
    {
        let target_position = target.entity.and_then(|e| targets.get(e).ok()).map(|t| t.translation);

        // Defender при активной бомбе приоритизирует objective
        let objective = match (actor.role, bomb_position) {
            (Role::Defender, Some(bomb)) => Some(bomb),
            _ => target_position,
        };

        match state {
            AiState::Idle => {
                if *command != MovementCommand::Idle {
                    *command = MovementCommand::Idle;
                }
                input.clear();
            }

            AiState::Patrol => {
                let Some(mut route) = route else {
                    // Маршрута нет — ведём себя как Idle, FSM сам не
                    // заведёт сюда без waypoint'ов
                    *command = MovementCommand::Idle;
                    input.clear();
                    continue;
                };

                let Some(waypoint) = route.current() else {
                    *command = MovementCommand::Idle;
                    input.clear();
                    continue;
                };

                input.sprint = false;
                input.face_toward = None;
                *command = MovementCommand::MoveTo { target: waypoint };

                // Прибыли — следующая точка (циклично)
                if flat_distance(transform.translation, waypoint) <= config.patrol_arrive_radius {
                    route.advance();
                }
            }

            AiState::Chase => {
                let Some(destination) = objective else {
                    *command = MovementCommand::Idle;
                    input.clear();
                    continue;
                };

                // Follow за живой целью; к бомбе — MoveTo
                *command = match (actor.role, bomb_position, target.entity) {
                    (Role::Defender, Some(bomb), _) => MovementCommand::MoveTo { target: bomb },
                    (_, _, Some(target_entity)) => MovementCommand::Follow {
                        target: target_entity,
                    },
                    _ => MovementCommand::MoveTo {
                        target: destination,
                    },
                };

                // Спринт/оружие выбираем по дистанции до ЦЕЛИ, не до бомбы
                let distance_to_target = target_position
                    .map(|p| transform.translation.distance(p))
                    .unwrap_or(f32::INFINITY);

                input.sprint = distance_to_target > config.melee_range * config.sprint_range_factor;
                input.face_toward = None;

                let kind = if distance_to_target <= config.melee_range * 1.2 {
                    WeaponKind::SwordShield
                } else if distance_to_target <= config.shoot_range {
                    WeaponKind::Bow
                } else {
                    WeaponKind::SwordShield
                };
                switch_weapon(entity, kind, &mut equipped, &mut weapon_events);
            }

            AiState::Attack => {
                // Навигация выключена; движение пишет attack система
                if *command != MovementCommand::Idle {
                    *command = MovementCommand::Idle;
                }
            }

            AiState::Search => {
                // Defender с активной бомбой ищет у бомбы, иначе у last seen
                let destination = match (actor.role, bomb_position) {
                    (Role::Defender, Some(bomb)) => Some(bomb),
                    _ => memory
                        .time_since_seen
                        .is_finite()
                        .then_some(memory.last_seen_position),
                };

                let Some(destination) = destination else {
                    *command = MovementCommand::Idle;
                    input.clear();
                    continue;
                };

                *command = MovementCommand::MoveTo {
                    target: destination,
                };
                input.sprint = false;
                input.face_toward = None;
            }
        }
    }
}
