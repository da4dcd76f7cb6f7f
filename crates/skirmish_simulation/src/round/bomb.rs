//! Bomb objective: закладка, fuse, defuse
//!
//! Кто и когда закладывает/разминирует решает host слой (игрок или
//! сценарий) через команды PlantBomb / StartDefuse / StopDefuse. AI
//! core бомбу только читает: defender приоритизирует её позицию в
//! Chase/Search. Максимум одна активная бомба за раунд.

use bevy::prelude::*;

use crate::components::Actor;
use crate::round::{MatchPhase, MatchState, RoundSettings};

/// Активная (заложенная) бомба
#[derive(Component, Debug, Clone)]
pub struct Bomb {
    /// Фракция заложившего (она выигрывает раунд при взрыве)
    pub planted_by_faction: u64,
    /// Секунды до взрыва
    pub fuse_remaining: f32,
    /// Сколько секунд надо удерживать defuse
    pub defuse_time: f32,
    /// Радиус в котором можно разминировать (метры)
    pub defuse_radius: f32,

    /// Текущий прогресс разминирования (секунды)
    pub defuse_progress: f32,
    /// Кто разминирует прямо сейчас
    pub defuser: Option<Entity>,
}

/// Команда: заложить бомбу (host/player слой)
#[derive(Event, Debug, Clone)]
pub struct PlantBomb {
    pub planter: Entity,
    pub position: Vec3,
}

/// Команда: начать разминирование
#[derive(Event, Debug, Clone)]
pub struct StartDefuse {
    pub entity: Entity,
}

/// Команда: прервать разминирование
#[derive(Event, Debug, Clone)]
pub struct StopDefuse {
    pub entity: Entity,
}

/// Event: бомба заложена
#[derive(Event, Debug, Clone)]
pub struct BombPlanted {
    pub position: Vec3,
}

/// Event: бомба взорвалась
#[derive(Event, Debug, Clone)]
pub struct BombExploded {
    pub planted_by_faction: u64,
}

/// Event: бомба разминирована
#[derive(Event, Debug, Clone)]
pub struct BombDefused {
    pub by: Entity,
}

/// Система: закладка бомбы по команде
pub fn plant_bombs(
    mut commands: Commands,
    mut plant_events: EventReader<PlantBomb>,
    mut planted_events: EventWriter<BombPlanted>,
    state: Res<MatchState>,
    settings: Res<RoundSettings>,
    existing: Query<(), With<Bomb>>,
    planters: Query<&Actor>,
) {
    for event in plant_events.read() {
        if state.phase != MatchPhase::RoundActive {
            continue;
        }
        if !existing.is_empty() {
            crate::logger::log("Bomb: уже есть активная, закладка пропущена");
            continue;
        }
        let Ok(planter) = planters.get(event.planter) else {
            continue;
        };

        commands.spawn((
            Bomb {
                planted_by_faction: planter.faction_id,
                fuse_remaining: settings.bomb.fuse,
                defuse_time: settings.bomb.defuse_time,
                defuse_radius: settings.bomb.defuse_radius,
                defuse_progress: 0.0,
                defuser: None,
            },
            Transform::from_translation(event.position),
        ));

        planted_events.write(BombPlanted {
            position: event.position,
        });

        crate::logger::log_info(&format!(
            "💣 Bomb planted by {:?} (faction {}) at {:?}",
            event.planter, planter.faction_id, event.position
        ));
    }
}

/// Система: команды start/stop defuse.
///
/// Начать может только один актор; повторный StartDefuse того же
/// актора прогресс не сбрасывает, чужой — игнорируется.
pub fn handle_defuse_commands(
    mut start_events: EventReader<StartDefuse>,
    mut stop_events: EventReader<StopDefuse>,
    mut bombs: Query<(&mut Bomb, &Transform)>,
    defusers: Query<&Transform, Without<Bomb>>,
) {
    let Ok((mut bomb, bomb_transform)) = bombs.single_mut() else {
        return;
    };

    for event in start_events.read() {
        if bomb.defuser.is_some() {
            continue;
        }
        let Ok(defuser_transform) = defusers.get(event.entity) else {
            continue;
        };
        let distance = defuser_transform
            .translation
            .distance(bomb_transform.translation);
        if distance > bomb.defuse_radius {
            continue;
        }

        bomb.defuser = Some(event.entity);
        bomb.defuse_progress = 0.0;
        crate::logger::log_info(&format!("Bomb: defuse started by {:?}", event.entity));
    }

    for event in stop_events.read() {
        if bomb.defuser == Some(event.entity) {
            bomb.defuser = None;
            bomb.defuse_progress = 0.0;
            crate::logger::log("Bomb: defuse cancelled");
        }
    }
}

/// Система: fuse countdown + defuse progress.
pub fn tick_bombs(
    mut commands: Commands,
    time: Res<Time<Fixed>>,
    mut bombs: Query<(Entity, &mut Bomb, &Transform)>,
    defusers: Query<&Transform, Without<Bomb>>,
    mut exploded_events: EventWriter<BombExploded>,
    mut defused_events: EventWriter<BombDefused>,
) {
    let delta = time.delta_secs();

    for (bomb_entity, mut bomb, bomb_transform) in bombs.iter_mut() {
        bomb.fuse_remaining -= delta;
        if bomb.fuse_remaining <= 0.0 {
            crate::logger::log_info("💥 Bomb EXPLODED!");
            exploded_events.write(BombExploded {
                planted_by_faction: bomb.planted_by_faction,
            });
            commands.entity(bomb_entity).despawn();
            continue;
        }

        let Some(defuser) = bomb.defuser else {
            continue;
        };

        // Вышел из радиуса (или умер/despawn) — отмена
        let in_range = defusers
            .get(defuser)
            .map(|t| t.translation.distance(bomb_transform.translation) <= bomb.defuse_radius)
            .unwrap_or(false);

        if !in_range {
            bomb.defuser = None;
            bomb.defuse_progress = 0.0;
            crate::logger::log("Bomb: defuse cancelled (out of range)");
            continue;
        }

        bomb.defuse_progress += delta;
        if bomb.defuse_progress >= bomb.defuse_time {
            crate::logger::log_info("Bomb: DEFUSED!");
            defused_events.write(BombDefused { by: defuser });
            commands.entity(bomb_entity).despawn();
        }
    }
}
