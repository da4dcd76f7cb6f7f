//! Melee swing — fire-and-forget замах с damage окном
//!
//! Attack система шлёт MeleeSwingStarted; здесь на атакующего вешается
//! окно [`MeleeSwing`], и пока оно открыто враги в пределах reach и
//! фронтальной дуги получают удар не больше одного раза за замах.
//! Анимацию замаха играет presentation слой по тому же событию.

use bevy::prelude::*;

use crate::combat::{DamageSource, HitLanded, Loadout};
use crate::components::{Actor, Health};

/// Event: актор начал замах мечом
#[derive(Event, Debug, Clone)]
pub struct MeleeSwingStarted {
    pub attacker: Entity,
}

/// Окно урона активного замаха
#[derive(Component, Debug, Clone)]
pub struct MeleeSwing {
    /// Сколько окну осталось жить (секунды)
    pub remaining: f32,
    /// Кого уже ударили этим замахом (дедуп)
    pub already_hit: Vec<Entity>,
}

/// Половина фронтальной дуги удара (градусы)
const SWING_HALF_ARC: f32 = 60.0;

/// Система: открытие damage окна по событию замаха
pub fn start_melee_swings(
    mut commands: Commands,
    mut swing_events: EventReader<MeleeSwingStarted>,
    loadouts: Query<&Loadout>,
) {
    for event in swing_events.read() {
        let Ok(loadout) = loadouts.get(event.attacker) else {
            continue;
        };

        if let Ok(mut entity_commands) = commands.get_entity(event.attacker) {
            entity_commands.insert(MeleeSwing {
                remaining: loadout.melee.swing_duration,
                already_hit: Vec::new(),
            });
        }
    }
}

/// Система: тик окон замаха + hit detection.
///
/// Упрощённая headless замена hitbox коллайдера: враг считается
/// задетым если он в reach и в пределах фронтальной дуги. Себя и
/// союзников меч не задевает, один враг — максимум один удар за замах.
pub fn tick_melee_swings(
    mut commands: Commands,
    time: Res<Time<Fixed>>,
    mut swings: Query<(Entity, &Actor, &Transform, &Loadout, &mut MeleeSwing)>,
    targets: Query<(Entity, &Actor, &Transform, &Health)>,
    mut hit_events: EventWriter<HitLanded>,
) {
    let delta = time.delta_secs();

    for (attacker, attacker_actor, attacker_transform, loadout, mut swing) in swings.iter_mut() {
        swing.remaining -= delta;
        if swing.remaining <= 0.0 {
            if let Ok(mut entity_commands) = commands.get_entity(attacker) {
                entity_commands.remove::<MeleeSwing>();
            }
            continue;
        }

        let forward_flat = {
            let f = *attacker_transform.forward();
            Vec3::new(f.x, 0.0, f.z)
        };

        for (target, target_actor, target_transform, target_health) in targets.iter() {
            if target == attacker {
                continue;
            }
            if target_actor.faction_id == attacker_actor.faction_id {
                continue;
            }
            if !target_health.is_alive() {
                continue;
            }
            if swing.already_hit.contains(&target) {
                continue;
            }

            let to_target = target_transform.translation - attacker_transform.translation;
            let to_target_flat = Vec3::new(to_target.x, 0.0, to_target.z);

            if to_target_flat.length() > loadout.melee.reach {
                continue;
            }

            // Фронтальная дуга
            if forward_flat.length_squared() > 1e-6 && to_target_flat.length_squared() > 1e-6 {
                let angle = forward_flat
                    .normalize()
                    .angle_between(to_target_flat.normalize())
                    .to_degrees();
                if angle > SWING_HALF_ARC {
                    continue;
                }
            }

            swing.already_hit.push(target);
            hit_events.write(HitLanded {
                attacker,
                target,
                damage: loadout.melee.damage,
                source: DamageSource::Melee,
            });
        }
    }
}
