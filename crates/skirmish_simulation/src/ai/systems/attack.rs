//! Attack state execution: ручное сближение, доворот, удары/выстрелы.
//!
//! Атака стреляет только когда:
//! - cooldown истёк
//! - forward в пределах facing_tolerance от направления на цель
//! - для лука дополнительно держится line of sight (подавляем выстрел,
//!   НЕ ставим в очередь)

use bevy::prelude::*;
use rand::Rng;

use crate::ai::{AiConfig, AiState, AiTarget, TargetMemory};
use crate::combat::{
    switch_weapon, BowDraw, Dead, EquippedWeapon, Loadout, MeleeSwingStarted, Shield, WeaponKind,
    WeaponSwitched,
};
use crate::components::{Actor, MovementInput};
use crate::DeterministicRng;

/// Система: исполнение Attack state (каждый тик).
pub fn ai_attack_execution(
    mut commands: Commands,
    mut agents: Query<
        (
            Entity,
            &AiState,
            &AiConfig,
            &AiTarget,
            &TargetMemory,
            &Transform,
            Option<&BowDraw>,
            &mut MovementInput,
            &mut Loadout,
            &mut EquippedWeapon,
            &mut Shield,
        ),
        Without<Dead>,
    >,
    targets: Query<&Transform, With<Actor>>,
    time: Res<Time<Fixed>>,
    mut rng: ResMut<DeterministicRng>,
    mut swing_events: EventWriter<MeleeSwingStarted>,
    mut weapon_events: EventWriter<WeaponSwitched>,
) {
    let delta = time.delta_secs();

    for (
        entity,
        state,
        config,
        target,
        memory,
        transform,
        drawing,
        mut input,
        mut loadout,
        mut equipped,
        mut shield,
    ) in agents.iter_mut()
    {
        if *state != AiState::Attack {
            continue;
        }

        let Some(target_position) = target.entity.and_then(|e| targets.get(e).ok()).map(|t| t.translation)
        else {
            // Цели нет — FSM разрулит на следующем decision tick
            input.clear();
            continue;
        };

        let distance = transform.translation.distance(target_position);
        let to_target_flat = {
            let d = target_position - transform.translation;
            Vec3::new(d.x, 0.0, d.z)
        };

        // Выбор melee vs bow по текущей дистанции
        let within_melee = distance <= config.melee_range * 1.1;
        let within_bow = distance <= config.shoot_range && memory.visible;

        if within_melee {
            switch_weapon(entity, WeaponKind::SwordShield, &mut equipped, &mut weapon_events);
        } else if within_bow {
            switch_weapon(entity, WeaponKind::Bow, &mut equipped, &mut weapon_events);
        } else {
            // Вне рабочей дистанции: стоим, FSM вернёт в Chase
            input.clear();
            shield.stop_block();
            continue;
        }

        // Доворачиваемся на цель каждый тик независимо от sub-case
        input.face_toward = Some(target_position);
        input.sprint = false;

        // Ручное движение: melee висит около hover радиуса, лук наступает
        let mut desired_move = Vec3::ZERO;
        if to_target_flat.length_squared() > 1e-6 {
            let forward_to_target = to_target_flat.normalize();

            if within_melee {
                let current_radius = to_target_flat.length();
                if current_radius > config.melee_hover_radius + config.melee_hover_deadband {
                    desired_move += forward_to_target; // шаг внутрь
                } else if current_radius < config.melee_hover_radius - config.melee_hover_deadband {
                    desired_move -= forward_to_target; // шаг наружу
                }

                try_start_block(config, &mut shield, &mut rng, delta);
            } else {
                // Лук: агрессивно сокращаем дистанцию
                desired_move += forward_to_target;
            }
        }

        input.direction = desired_move.normalize_or_zero();

        // --- Attack timing ---
        let facing_target =
            facing_within(*transform.forward(), to_target_flat, config.facing_tolerance);

        if !facing_target || !loadout.can_attack() {
            continue;
        }

        match equipped.kind {
            WeaponKind::SwordShield => {
                // Замах роняет блок (как и у игрока)
                shield.stop_block();
                swing_events.write(MeleeSwingStarted { attacker: entity });
                loadout.start_cooldown();
            }
            WeaponKind::Bow => {
                // Не стреляем в стены: без line of sight выстрел
                // подавляется, cooldown не тратится
                if !memory.visible {
                    continue;
                }
                if !loadout.bow.has_arrows() {
                    continue;
                }
                // Уже натягиваем — не инициируем второй выстрел
                if drawing.is_some() {
                    continue;
                }

                let Some(target_entity) = target.entity else {
                    continue;
                };

                // Отложенный выстрел: стрела вылетит через draw_delay,
                // смена оружия за это время отменяет (tick_bow_draws)
                commands.entity(entity).insert(BowDraw {
                    remaining: loadout.bow.draw_delay,
                    target: target_entity,
                    eye_height: config.eye_height,
                });
                loadout.start_cooldown();
            }
        }
    }
}

/// Смотрит ли forward на цель в пределах допуска (в горизонтальной
/// плоскости). Вырожденные вектора считаются "не смотрим".
fn facing_within(forward: Vec3, to_target: Vec3, tolerance_deg: f32) -> bool {
    let forward_flat = Vec3::new(forward.x, 0.0, forward.z);
    let to_target_flat = Vec3::new(to_target.x, 0.0, to_target.z);

    if forward_flat.length_squared() <= 1e-6 || to_target_flat.length_squared() <= 1e-6 {
        return false;
    }

    forward_flat
        .normalize()
        .angle_between(to_target_flat.normalize())
        .to_degrees()
        <= tolerance_deg
}

/// Вероятностный вход в блок в melee sub-case.
///
/// Шанс за секунду → шанс за тик; длительность и cooldown случайные
/// в настроенных диапазонах (детерминистичный RNG).
fn try_start_block(
    config: &AiConfig,
    shield: &mut Shield,
    rng: &mut DeterministicRng,
    delta: f32,
) {
    if !shield.can_start_block() {
        return;
    }

    if rng.rng.gen::<f32>() < config.block_chance_per_second * delta {
        let (dur_min, dur_max) = config.block_duration;
        let (cd_min, cd_max) = config.block_cooldown;
        let duration = rng.rng.gen_range(dur_min..dur_max);
        let cooldown = rng.rng.gen_range(cd_min..cd_max);
        shield.start_block(duration, cooldown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_tolerance_gate() {
        // Прямо на цель
        assert!(facing_within(Vec3::NEG_Z, Vec3::NEG_Z, 25.0));

        // ~20° — в допуске, ~30° — нет
        let off_20 = Vec3::new((20f32).to_radians().sin(), 0.0, -(20f32).to_radians().cos());
        let off_30 = Vec3::new((30f32).to_radians().sin(), 0.0, -(30f32).to_radians().cos());
        assert!(facing_within(Vec3::NEG_Z, off_20, 25.0));
        assert!(!facing_within(Vec3::NEG_Z, off_30, 25.0));

        // Цель сбоку/сзади
        assert!(!facing_within(Vec3::NEG_Z, Vec3::X, 25.0));
        assert!(!facing_within(Vec3::NEG_Z, Vec3::Z, 25.0));

        // Вырожденное направление
        assert!(!facing_within(Vec3::NEG_Z, Vec3::ZERO, 25.0));
        assert!(!facing_within(Vec3::Y, Vec3::NEG_Z, 25.0));
    }

    #[test]
    fn test_block_respects_cooldown_gate() {
        let config = AiConfig::default();
        let mut shield = Shield::default();
        let mut rng = DeterministicRng::new(7);

        // Форсируем старт блока (шанс 100% за тик)
        let mut eager = config.clone();
        eager.block_chance_per_second = 1.0;
        try_start_block(&eager, &mut shield, &mut rng, 10.0);
        assert!(shield.blocking);

        let timer = shield.block_timer;
        let (dur_min, dur_max) = eager.block_duration;
        assert!(timer >= dur_min && timer <= dur_max);

        // Пока blocking/cooldown — повторный вход запрещён
        let before = shield.block_timer;
        try_start_block(&eager, &mut shield, &mut rng, 10.0);
        assert_eq!(shield.block_timer, before);
    }
}
