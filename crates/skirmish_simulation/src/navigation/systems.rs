//! Movement системы: MovementCommand → MovementInput → Transform.

use bevy::prelude::*;

use crate::ai::AiState;
use crate::combat::{Dead, Shield};
use crate::components::{MovementCommand, MovementInput, MovementSpeed};
use crate::navigation::NavigationService;

/// Система: резолв MovementCommand через navigation backend.
///
/// Attack state пропускаем целиком — там актор рулит вручную и
/// навигация остановлена.
pub fn resolve_movement_commands(
    mut agents: Query<(
        Entity,
        &Transform,
        &MovementCommand,
        &mut MovementInput,
        Option<&AiState>,
    )>,
    targets: Query<&Transform>,
    mut nav: ResMut<NavigationService>,
) {
    for (entity, transform, command, mut input, state) in agents.iter_mut() {
        if state == Some(&AiState::Attack) {
            // Навигация приостановлена, путь сброшен; движением в Attack
            // владеет attack система
            nav.0.stop(entity);
            continue;
        }

        let position = transform.translation;

        match command {
            MovementCommand::Idle => {
                nav.0.stop(entity);
                input.direction = Vec3::ZERO;
            }

            MovementCommand::MoveTo { target } => {
                nav.0.set_destination(entity, position, *target);
                input.direction = nav.0.desired_velocity(entity, position);
            }

            MovementCommand::Follow { target } => {
                // Destination обновляется каждый тик за живой целью
                match targets.get(*target) {
                    Ok(target_transform) => {
                        nav.0
                            .set_destination(entity, position, target_transform.translation);
                        input.direction = nav.0.desired_velocity(entity, position);
                    }
                    Err(_) => {
                        nav.0.stop(entity);
                        input.direction = Vec3::ZERO;
                    }
                }
            }
        }
    }
}

/// Фактор доворота по направлению движения (вне Attack)
const MOVE_TURN_RATE: f32 = 10.0;

/// Система: интеграция Transform из MovementInput.
///
/// Скорость = walk/sprint × block множитель щита. Поворот: на
/// face_toward точку (Attack целится) либо по направлению движения.
pub fn apply_movement(
    mut agents: Query<
        (
            &mut Transform,
            &MovementInput,
            &MovementSpeed,
            Option<&Shield>,
            Option<&crate::ai::AiConfig>,
        ),
        Without<Dead>,
    >,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (mut transform, input, speed, shield, config) in agents.iter_mut() {
        let multiplier = shield.map_or(1.0, |s| s.speed_multiplier());
        let velocity = input.direction * speed.current(input.sprint) * multiplier;

        transform.translation += velocity * delta;

        let rate = config.map_or(MOVE_TURN_RATE, |c| c.turn_rate);

        // Доворот: целимся в точку либо смотрим куда идём
        let face_direction = match input.face_toward {
            Some(point) => {
                let d = point - transform.translation;
                Vec3::new(d.x, 0.0, d.z)
            }
            None => Vec3::new(velocity.x, 0.0, velocity.z),
        };

        if face_direction.length_squared() > 1e-4 {
            let target_rotation = Transform::IDENTITY
                .looking_to(face_direction, Vec3::Y)
                .rotation;
            transform.rotation = transform
                .rotation
                .slerp(target_rotation, (rate * delta).min(1.0));
        }
    }
}
