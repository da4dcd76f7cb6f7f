//! Perception systems: выбор цели + обновление памяти о ней.

use bevy::prelude::*;

use crate::ai::perception::can_see_target;
use crate::ai::{AiConfig, AiState, AiTarget, TargetMemory};
use crate::components::{Actor, Health};
use crate::sight::SightService;

/// Система: захват цели если её нет.
///
/// Берём ближайшего живого актора другой фракции. Потерянная цель
/// (умерла/despawn) сбрасывается в None — FSM останется в Idle/Patrol,
/// это не ошибка.
pub fn acquire_targets(
    mut seekers: Query<(Entity, &Actor, &Transform, &mut AiTarget), With<AiState>>,
    candidates: Query<(Entity, &Actor, &Transform, &Health)>,
) {
    for (seeker_entity, seeker_actor, seeker_transform, mut target) in seekers.iter_mut() {
        // Валидна ли текущая цель
        if let Some(current) = target.entity {
            let still_valid = candidates
                .get(current)
                .map(|(_, _, _, health)| health.is_alive())
                .unwrap_or(false);

            if still_valid {
                continue;
            }

            target.entity = None;
            crate::logger::log(&format!(
                "AI: {:?} target {:?} gone, dropping",
                seeker_entity, current
            ));
        }

        // Ищем ближайшего живого врага (другая фракция)
        let mut nearest: Option<(Entity, f32)> = None;

        for (candidate_entity, candidate_actor, candidate_transform, candidate_health) in
            candidates.iter()
        {
            if candidate_entity == seeker_entity {
                continue;
            }
            if candidate_actor.faction_id == seeker_actor.faction_id {
                continue;
            }
            if !candidate_health.is_alive() {
                continue;
            }

            let distance = seeker_transform
                .translation
                .distance(candidate_transform.translation);

            match nearest {
                Some((_, best)) if distance >= best => {}
                _ => nearest = Some((candidate_entity, distance)),
            }
        }

        if let Some((found, _)) = nearest {
            target.entity = Some(found);
            crate::logger::log(&format!(
                "👁️ AI: {:?} acquired target {:?}",
                seeker_entity, found
            ));
        }
    }
}

/// Система: обновление TargetMemory из can_see результата.
///
/// Perception сам по себе чистый запрос; вся мутация — здесь:
/// видим → time_since_seen = 0 + кэш last seen позиции,
/// не видим → time_since_seen растёт.
pub fn update_perception(
    mut agents: Query<(&Transform, &AiConfig, &AiTarget, &mut TargetMemory), With<AiState>>,
    targets: Query<&Transform>,
    sight: Res<SightService>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (transform, config, target, mut memory) in agents.iter_mut() {
        let target_position = target.entity.and_then(|e| targets.get(e).ok());

        let visible = match target_position {
            Some(target_transform) => can_see_target(
                transform.translation,
                *transform.forward(),
                target_transform.translation,
                config,
                &sight,
            ),
            None => false,
        };

        memory.visible = visible;

        if visible {
            memory.time_since_seen = 0.0;
            // unwrap безопасен: visible ⇒ target_position Some
            memory.last_seen_position = target_position.map(|t| t.translation).unwrap_or_default();
        } else {
            memory.time_since_seen += delta;
        }
    }
}
