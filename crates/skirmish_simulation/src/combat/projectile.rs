//! Стрелы: баллистический полёт, попадания, lifetime
//!
//! ArrowFired (из AI или player слоя) спавнит entity стрелы. Полёт —
//! интеграция с гравитацией; попадание — ближайший актор у отрезка
//! текущего шага, либо статическая геометрия (стрела втыкается).

use bevy::prelude::*;

use crate::combat::{DamageSource, EquippedWeapon, HitLanded, Loadout, WeaponKind};
use crate::components::{Actor, Health};
use crate::sight::{LayerMask, SightService};

/// Натяжение лука — отложенный выстрел.
///
/// Между решением стрелять и вылетом стрелы проходит draw_delay;
/// смена оружия (или смерть) за это время отменяет выстрел, стрела
/// не тратится.
#[derive(Component, Debug, Clone)]
pub struct BowDraw {
    /// Секунды до вылета стрелы
    pub remaining: f32,
    /// В кого целимся (направление берётся в момент вылета)
    pub target: Entity,
    /// Высота глаз стрелка (точка вылета)
    pub eye_height: f32,
}

/// Event: выстрел сделан (fire-and-forget)
#[derive(Event, Debug, Clone)]
pub struct ArrowFired {
    pub shooter: Entity,
    pub origin: Vec3,
    /// Нормализованное направление выстрела
    pub direction: Vec3,
    /// Начальная скорость (м/с)
    pub speed: f32,
    pub damage: u32,
}

/// Летящая стрела
#[derive(Component, Debug, Clone)]
pub struct Arrow {
    pub shooter: Entity,
    pub velocity: Vec3,
    pub damage: u32,
    /// Секунды до исчезновения
    pub lifetime: f32,
}

const GRAVITY: f32 = -9.81;
const ARROW_LIFETIME: f32 = 10.0;
/// Радиус попадания вокруг центра масс цели (метры)
const HIT_RADIUS: f32 = 0.5;
/// Высота центра масс цели над позицией (метры)
const TARGET_CHEST_HEIGHT: f32 = 1.0;

/// Система: тик натяжения лука → вылет стрелы.
///
/// Отмена: оружие сменилось, цель исчезла, стрелок умер (BowDraw
/// снимается в disable_ai_on_death), кончились стрелы.
pub fn tick_bow_draws(
    mut commands: Commands,
    time: Res<Time<Fixed>>,
    mut draws: Query<(Entity, &mut BowDraw, &Transform, &EquippedWeapon, &mut Loadout)>,
    targets: Query<&Transform, With<Actor>>,
    mut fire_events: EventWriter<ArrowFired>,
) {
    let delta = time.delta_secs();

    for (shooter, mut draw, transform, equipped, mut loadout) in draws.iter_mut() {
        draw.remaining -= delta;
        if draw.remaining > 0.0 {
            continue;
        }

        if let Ok(mut entity_commands) = commands.get_entity(shooter) {
            entity_commands.remove::<BowDraw>();
        }

        // Лук убрали пока натягивали — выстрел отменён
        if equipped.kind != WeaponKind::Bow {
            crate::logger::log(&format!("🏹 {:?} draw cancelled (weapon switched)", shooter));
            continue;
        }

        let Ok(target_transform) = targets.get(draw.target) else {
            continue;
        };

        if !loadout.bow.consume_arrow() {
            continue;
        }

        let origin = transform.translation + Vec3::Y * draw.eye_height;
        let aim_point = target_transform.translation + Vec3::Y * (draw.eye_height * 0.6);
        let Some(direction) = (aim_point - origin).try_normalize() else {
            continue;
        };

        fire_events.write(ArrowFired {
            shooter,
            origin,
            direction,
            speed: loadout.bow.arrow_speed,
            damage: loadout.bow.damage,
        });
    }
}

/// Система: спавн стрел по ArrowFired
pub fn spawn_arrows(mut commands: Commands, mut fire_events: EventReader<ArrowFired>) {
    for event in fire_events.read() {
        commands.spawn((
            Arrow {
                shooter: event.shooter,
                velocity: event.direction * event.speed,
                damage: event.damage,
                lifetime: ARROW_LIFETIME,
            },
            Transform::from_translation(event.origin),
        ));

        crate::logger::log(&format!(
            "🏹 Arrow fired by {:?} ({} dmg, {:.0} m/s)",
            event.shooter, event.damage, event.speed
        ));
    }
}

/// Система: полёт стрел + коллизии.
pub fn tick_arrows(
    mut commands: Commands,
    time: Res<Time<Fixed>>,
    sight: Res<SightService>,
    mut arrows: Query<(Entity, &mut Arrow, &mut Transform), Without<Actor>>,
    targets: Query<(Entity, &Actor, &Transform, &Health), Without<Arrow>>,
    mut hit_events: EventWriter<HitLanded>,
) {
    let delta = time.delta_secs();

    for (arrow_entity, mut arrow, mut transform) in arrows.iter_mut() {
        arrow.lifetime -= delta;
        if arrow.lifetime <= 0.0 {
            commands.entity(arrow_entity).despawn();
            continue;
        }

        arrow.velocity.y += GRAVITY * delta;

        let start = transform.translation;
        let step = arrow.velocity * delta;
        let end = start + step;

        // Воткнулись в геометрию?
        if sight.segment_blocked(start, end, LayerMask::default()) {
            commands.entity(arrow_entity).despawn();
            continue;
        }

        // Попали в актора? (ближайшая точка отрезка к центру масс)
        let mut hit_target = None;
        for (target, _, target_transform, target_health) in targets.iter() {
            if target == arrow.shooter {
                continue;
            }
            if !target_health.is_alive() {
                continue;
            }

            let chest = target_transform.translation + Vec3::Y * TARGET_CHEST_HEIGHT;
            if segment_point_distance(start, end, chest) <= HIT_RADIUS {
                hit_target = Some(target);
                break;
            }
        }

        if let Some(target) = hit_target {
            hit_events.write(HitLanded {
                attacker: arrow.shooter,
                target,
                damage: arrow.damage,
                source: DamageSource::Ranged,
            });
            commands.entity(arrow_entity).despawn();
            continue;
        }

        transform.translation = end;

        // Нос по направлению полёта (для presentation слоя)
        if arrow.velocity.length_squared() > 1e-4 {
            transform.rotation = Transform::IDENTITY
                .looking_to(arrow.velocity, Vec3::Y)
                .rotation;
        }
    }
}

/// Дистанция от точки до отрезка ab
fn segment_point_distance(a: Vec3, b: Vec3, point: Vec3) -> f32 {
    let ab = b - a;
    let length_squared = ab.length_squared();
    if length_squared <= f32::EPSILON {
        return a.distance(point);
    }

    let t = ((point - a).dot(ab) / length_squared).clamp(0.0, 1.0);
    (a + ab * t).distance(point)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_point_distance() {
        let a = Vec3::ZERO;
        let b = Vec3::new(10.0, 0.0, 0.0);

        // Точка над серединой отрезка
        assert_eq!(segment_point_distance(a, b, Vec3::new(5.0, 2.0, 0.0)), 2.0);
        // Точка за концом — меряем до конца
        assert_eq!(segment_point_distance(a, b, Vec3::new(13.0, 0.0, 4.0)), 5.0);
        // Вырожденный отрезок
        assert_eq!(
            segment_point_distance(a, a, Vec3::new(0.0, 3.0, 0.0)),
            3.0
        );
    }
}
