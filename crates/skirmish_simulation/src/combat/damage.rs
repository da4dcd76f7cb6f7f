//! Damage pipeline: HitLanded → блок щитом → Health → события
//!
//! Все источники урона (меч, стрелы) сходятся в HitLanded; здесь
//! единственное место где урон реально применяется к Health.

use bevy::prelude::*;

use crate::combat::Shield;
use crate::components::{Health, MovementCommand, MovementInput};
use crate::navigation::NavigationService;

/// Источник урона (для щита/эффектов)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageSource {
    Melee,
    Ranged,
}

/// Event: удар дошёл до цели (до вычета блока)
#[derive(Event, Debug, Clone)]
pub struct HitLanded {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: u32,
    pub source: DamageSource,
}

/// Событие: урон нанесён (после блока)
///
/// Используется presentation слоем (hit анимация, звуки, HP бар).
#[derive(Event, Debug, Clone)]
pub struct DamageDealt {
    pub attacker: Entity,
    pub target: Entity,
    /// Фактически снятый урон
    pub damage: u32,
    /// Сколько поглотил щит
    pub absorbed: u32,
    pub source: DamageSource,
    pub target_died: bool,
}

/// Событие: entity умер (health == 0)
#[derive(Event, Debug, Clone)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// Компонент-маркер: entity мертв.
///
/// Деспавн не автоматический — трупы остаются до конца раунда.
#[derive(Component, Debug)]
pub struct Dead;

/// Система: применение урона.
///
/// 1. Читаем HitLanded
/// 2. Вычитаем поглощение щита (если цель блокирует)
/// 3. Применяем к Health
/// 4. Генерируем DamageDealt / EntityDied
pub fn apply_damage(
    mut hit_events: EventReader<HitLanded>,
    mut damage_events: EventWriter<DamageDealt>,
    mut died_events: EventWriter<EntityDied>,
    mut targets: Query<(&mut Health, Option<&Shield>)>,
) {
    for hit in hit_events.read() {
        // Self-hit не должен случаться (melee/arrow системы фильтруют)
        if hit.attacker == hit.target {
            crate::logger::log_warning(&format!(
                "apply_damage: self-hit от {:?}, пропускаем",
                hit.attacker
            ));
            continue;
        }

        let Ok((mut health, shield)) = targets.get_mut(hit.target) else {
            crate::logger::log_warning(&format!(
                "apply_damage: target {:?} без Health",
                hit.target
            ));
            continue;
        };

        let was_alive = health.is_alive();
        if !was_alive {
            continue;
        }

        let absorbed = shield.map_or(0, |s| s.absorb(hit.damage));
        let final_damage = hit.damage.saturating_sub(absorbed);

        health.take_damage(final_damage);
        let died = !health.is_alive();

        if absorbed > 0 {
            crate::logger::log(&format!(
                "🛡️ {:?} blocked {} of {} damage",
                hit.target, absorbed, hit.damage
            ));
        }
        crate::logger::log(&format!(
            "💥 {:?} hit {:?} for {} ({:?}), HP {}/{}",
            hit.attacker, hit.target, final_damage, hit.source, health.current, health.max
        ));

        damage_events.write(DamageDealt {
            attacker: hit.attacker,
            target: hit.target,
            damage: final_damage,
            absorbed,
            source: hit.source,
            target_died: died,
        });

        if died {
            died_events.write(EntityDied {
                entity: hit.target,
                killer: Some(hit.attacker),
            });

            crate::logger::log_info(&format!(
                "Entity {:?} killed by {:?}",
                hit.target, hit.attacker
            ));
        }
    }
}

/// Система: отключение AI при смерти.
///
/// Убирает AiState у мертвых, обнуляет движение и вешает маркер Dead —
/// трупы не двигаются и не атакуют до respawn'а.
pub fn disable_ai_on_death(
    mut commands: Commands,
    mut death_events: EventReader<EntityDied>,
    mut movers: Query<(&mut MovementInput, &mut MovementCommand)>,
    mut nav: ResMut<NavigationService>,
) {
    for event in death_events.read() {
        if let Ok((mut input, mut command)) = movers.get_mut(event.entity) {
            input.clear();
            *command = MovementCommand::Idle;
        }
        nav.0.stop(event.entity);

        if let Ok(mut entity_commands) = commands.get_entity(event.entity) {
            entity_commands.remove::<crate::ai::AiState>();
            entity_commands.remove::<crate::combat::MeleeSwing>();
            entity_commands.remove::<crate::combat::BowDraw>();
            entity_commands.insert(Dead);

            crate::logger::log_info(&format!("Disabled AI for dead entity {:?}", event.entity));
        }
    }
}
