//! Round/match manager
//!
//! Раунд заканчивается смертью бойца, взрывом или разминированием
//! бомбы. Победившая фракция получает очко; первая набравшая
//! rounds_to_win берёт матч. Между раундами — restart delay
//! (явный countdown, владелец — MatchState, отменяется сменой фазы),
//! затем respawn обоих бойцов с полным сбросом.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod bomb;

pub use bomb::{
    Bomb, BombDefused, BombExploded, BombPlanted, PlantBomb, StartDefuse, StopDefuse,
};

use crate::ai::{AiState, DecisionClock, TargetMemory};
use crate::combat::{
    Arrow, BowDraw, Dead, EntityDied, EquippedWeapon, Loadout, MeleeSwing, Shield, WeaponKind,
};
use crate::components::{Actor, Health, MovementCommand, MovementInput};
use crate::navigation::NavigationService;
use crate::SimSet;

/// Настройки матча (фиксируются при старте)
#[derive(Resource, Debug, Clone)]
pub struct RoundSettings {
    /// Сколько раундов нужно выиграть для победы в матче
    pub rounds_to_win: u32,
    /// Пауза между раундами (секунды)
    pub restart_delay: f32,
    /// Spawn точки по фракциям
    pub spawn_points: Vec<(u64, Vec3)>,
    pub bomb: BombSettings,
}

impl Default for RoundSettings {
    fn default() -> Self {
        Self {
            rounds_to_win: 3,
            restart_delay: 3.0,
            spawn_points: Vec::new(),
            bomb: BombSettings::default(),
        }
    }
}

impl RoundSettings {
    fn spawn_for(&self, faction_id: u64) -> Option<Vec3> {
        self.spawn_points
            .iter()
            .find(|(faction, _)| *faction == faction_id)
            .map(|(_, position)| *position)
    }
}

/// Настройки bomb objective
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BombSettings {
    /// Секунды от закладки до взрыва
    pub fuse: f32,
    /// Секунды удержания defuse
    pub defuse_time: f32,
    /// Радиус разминирования (метры)
    pub defuse_radius: f32,
}

impl Default for BombSettings {
    fn default() -> Self {
        Self {
            fuse: 40.0,
            defuse_time: 5.0,
            defuse_radius: 3.0,
        }
    }
}

/// Состояние матча
#[derive(Resource, Debug, Clone)]
pub struct MatchState {
    /// Номер текущего раунда (1-based)
    pub round: u32,
    /// Очки по фракциям
    pub scores: HashMap<u64, u32>,
    pub phase: MatchPhase,
}

impl Default for MatchState {
    fn default() -> Self {
        Self {
            round: 1,
            scores: HashMap::new(),
            phase: MatchPhase::RoundActive,
        }
    }
}

impl MatchState {
    pub fn score_of(&self, faction_id: u64) -> u32 {
        self.scores.get(&faction_id).copied().unwrap_or(0)
    }
}

/// Фаза матча
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchPhase {
    /// Раунд идёт
    RoundActive,
    /// Раунд закончен, тикает countdown до respawn'а
    RoundOver { restart_timer: f32 },
    /// Матч закончен, дальше ничего не происходит
    MatchOver { winner_faction: u64 },
}

/// Чем закончился раунд
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    Elimination,
    BombExploded,
    BombDefused,
}

/// Event: раунд стартовал (после respawn'а)
#[derive(Event, Debug, Clone)]
pub struct RoundStarted {
    pub round: u32,
}

/// Event: раунд закончился
#[derive(Event, Debug, Clone)]
pub struct RoundEnded {
    pub winner_faction: u64,
    pub outcome: RoundOutcome,
}

/// Event: матч закончился
#[derive(Event, Debug, Clone)]
pub struct MatchEnded {
    pub winner_faction: u64,
}

/// Round Plugin
pub struct RoundPlugin;

impl Plugin for RoundPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MatchState>()
            .init_resource::<RoundSettings>()
            .add_event::<PlantBomb>()
            .add_event::<StartDefuse>()
            .add_event::<StopDefuse>()
            .add_event::<BombPlanted>()
            .add_event::<BombExploded>()
            .add_event::<BombDefused>()
            .add_event::<RoundStarted>()
            .add_event::<RoundEnded>()
            .add_event::<MatchEnded>();

        app.add_systems(
            FixedUpdate,
            (
                bomb::plant_bombs,
                bomb::handle_defuse_commands,
                bomb::tick_bombs,
                score_rounds,
                tick_round_restart,
            )
                .chain()
                .in_set(SimSet::Round),
        );
    }
}

/// Система: исходы раунда → счёт → фаза.
///
/// Первый исход в тике побеждает, остальные события этого тика
/// игнорируются (раунд уже не RoundActive).
pub fn score_rounds(
    mut state: ResMut<MatchState>,
    settings: Res<RoundSettings>,
    mut died_events: EventReader<EntityDied>,
    mut exploded_events: EventReader<BombExploded>,
    mut defused_events: EventReader<BombDefused>,
    actors: Query<(Entity, &Actor, &Health)>,
    mut round_ended: EventWriter<RoundEnded>,
    mut match_ended: EventWriter<MatchEnded>,
) {
    for death in died_events.read() {
        if state.phase != MatchPhase::RoundActive {
            continue;
        }

        // Фракция победителя: убийца, иначе любой выживший противник
        let dead_faction = actors.get(death.entity).map(|(_, a, _)| a.faction_id).ok();
        let winner = death
            .killer
            .and_then(|killer| actors.get(killer).ok())
            .map(|(_, actor, _)| actor.faction_id)
            .or_else(|| {
                actors
                    .iter()
                    .find(|(entity, actor, health)| {
                        *entity != death.entity
                            && health.is_alive()
                            && Some(actor.faction_id) != dead_faction
                    })
                    .map(|(_, actor, _)| actor.faction_id)
            });

        let Some(winner) = winner else {
            crate::logger::log_warning("Round: death without surviving opponent, no score");
            continue;
        };

        award_round(
            &mut state,
            &settings,
            winner,
            RoundOutcome::Elimination,
            &mut round_ended,
            &mut match_ended,
        );
    }

    for explosion in exploded_events.read() {
        if state.phase != MatchPhase::RoundActive {
            continue;
        }
        award_round(
            &mut state,
            &settings,
            explosion.planted_by_faction,
            RoundOutcome::BombExploded,
            &mut round_ended,
            &mut match_ended,
        );
    }

    for defused in defused_events.read() {
        if state.phase != MatchPhase::RoundActive {
            continue;
        }
        let Ok((_, actor, _)) = actors.get(defused.by) else {
            continue;
        };
        award_round(
            &mut state,
            &settings,
            actor.faction_id,
            RoundOutcome::BombDefused,
            &mut round_ended,
            &mut match_ended,
        );
    }
}

fn award_round(
    state: &mut MatchState,
    settings: &RoundSettings,
    winner_faction: u64,
    outcome: RoundOutcome,
    round_ended: &mut EventWriter<RoundEnded>,
    match_ended: &mut EventWriter<MatchEnded>,
) {
    let score = state.scores.entry(winner_faction).or_insert(0);
    *score += 1;
    let score = *score;

    crate::logger::log_info(&format!(
        "🏆 FACTION {} WINS ROUND {} ({:?}), score {}",
        winner_faction, state.round, outcome, score
    ));

    round_ended.write(RoundEnded {
        winner_faction,
        outcome,
    });

    if score >= settings.rounds_to_win {
        state.phase = MatchPhase::MatchOver { winner_faction };
        match_ended.write(MatchEnded { winner_faction });
        crate::logger::log_info(&format!("🏆 FACTION {} WINS THE MATCH!", winner_faction));
    } else {
        state.phase = MatchPhase::RoundOver {
            restart_timer: settings.restart_delay,
        };
    }
}

/// Система: countdown между раундами → respawn.
///
/// Полный сброс бойцов: health, cooldowns, ammo, щит, AI state,
/// позиции на spawn точки; стрелы и бомба зачищаются.
pub fn tick_round_restart(
    mut commands: Commands,
    time: Res<Time<Fixed>>,
    mut state: ResMut<MatchState>,
    settings: Res<RoundSettings>,
    mut round_started: EventWriter<RoundStarted>,
    mut agents: Query<(
        Entity,
        &Actor,
        &mut Transform,
        &mut Health,
        &mut Loadout,
        &mut Shield,
        &mut MovementInput,
        &mut MovementCommand,
        &mut TargetMemory,
        &mut DecisionClock,
        &mut EquippedWeapon,
    )>,
    arrows: Query<Entity, With<Arrow>>,
    bombs: Query<Entity, With<Bomb>>,
    mut nav: ResMut<NavigationService>,
) {
    let MatchPhase::RoundOver { restart_timer } = state.phase else {
        return;
    };

    let remaining = restart_timer - time.delta_secs();
    if remaining > 0.0 {
        state.phase = MatchPhase::RoundOver {
            restart_timer: remaining,
        };
        return;
    }

    // Зачистка снарядов и objective прошлого раунда
    for arrow in arrows.iter() {
        commands.entity(arrow).despawn();
    }
    for bomb in bombs.iter() {
        commands.entity(bomb).despawn();
    }

    for (
        entity,
        actor,
        mut transform,
        mut health,
        mut loadout,
        mut shield,
        mut input,
        mut command,
        mut memory,
        mut clock,
        mut equipped,
    ) in agents.iter_mut()
    {
        health.reset();
        loadout.reset();
        shield.reset();
        input.clear();
        *command = MovementCommand::Idle;
        *memory = TargetMemory::default();
        clock.timer = 0.0;
        equipped.kind = WeaponKind::SwordShield;
        nav.0.stop(entity);

        if let Some(spawn) = settings.spawn_for(actor.faction_id) {
            transform.translation = spawn;
        }

        if let Ok(mut entity_commands) = commands.get_entity(entity) {
            entity_commands.remove::<Dead>();
            entity_commands.remove::<MeleeSwing>();
            entity_commands.remove::<BowDraw>();
            entity_commands.insert(AiState::Idle);
        }
    }

    state.round += 1;
    state.phase = MatchPhase::RoundActive;
    let round = state.round;

    round_started.write(RoundStarted { round });
    crate::logger::log_info(&format!("=== ROUND {} ===", round));
}
