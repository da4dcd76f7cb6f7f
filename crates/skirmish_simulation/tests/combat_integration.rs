//! Combat integration test
//!
//! Дуэль attacker vs defender headless, N тиков, детерминистично.
//!
//! Проверяем:
//! - Health/ammo инварианты на длинном прогоне
//! - Детерминизм (3 прогона с одним seed)
//! - Round flow: смерть → счёт → respawn
//! - Нет паники/крашей

use bevy::prelude::*;

use skirmish_simulation::round::{MatchPhase, MatchState, RoundSettings};
use skirmish_simulation::*;

/// Helper: полный combat App со всеми plugins
fn create_combat_app(seed: u64) -> App {
    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);
    app
}

/// Helper: spawn бойца с AI, развёрнутого лицом к точке
fn spawn_fighter(
    world: &mut World,
    position: Vec3,
    facing: Vec3,
    faction_id: u64,
    role: Role,
) -> Entity {
    world
        .spawn((
            Transform::from_translation(position).looking_at(facing, Vec3::Y),
            Actor { faction_id, role },
            AiState::default(),
            AiConfig::default(),
            AiTarget::default(),
            TargetMemory::default(),
            DecisionClock::default(),
            PatrolRoute::default(),
            MovementCommand::default(),
            MovementInput::default(),
            MovementSpeed::default(),
            Loadout::default(),
            EquippedWeapon::default(),
            Shield::default(),
        ))
        .id()
}

fn spawn_duel(app: &mut App) -> (Entity, Entity) {
    let p1 = Vec3::new(-5.0, 0.0, 0.0);
    let p2 = Vec3::new(5.0, 0.0, 0.0);
    let fighter1 = spawn_fighter(app.world_mut(), p1, p2, 1, Role::Attacker);
    let fighter2 = spawn_fighter(app.world_mut(), p2, p1, 2, Role::Defender);
    (fighter1, fighter2)
}

/// Test: дуэль 2000 тиков без краша, инварианты держатся
#[test]
fn test_duel_2000_ticks_invariants() {
    let mut app = create_combat_app(42);
    let (fighter1, fighter2) = spawn_duel(&mut app);

    for tick in 0..2000 {
        app.update();

        if tick % 100 == 0 {
            check_invariants(&mut app, fighter1, fighter2, tick);
        }
    }

    skirmish_simulation::logger::log("✓ Duel integration: 2000 ticks completed");
}

/// Test: детерминизм — 3 прогона с одним seed дают идентичные снепшоты
#[test]
fn test_combat_determinism_three_runs() {
    const SEED: u64 = 42;
    const TICKS: usize = 500;

    let snapshot1 = run_duel_and_snapshot(SEED, TICKS);
    let snapshot2 = run_duel_and_snapshot(SEED, TICKS);
    let snapshot3 = run_duel_and_snapshot(SEED, TICKS);

    assert_eq!(snapshot1, snapshot2, "determinism failed: run 1 != run 2");
    assert_eq!(snapshot2, snapshot3, "determinism failed: run 2 != run 3");
}

/// Test: смерть бойца завершает раунд, после паузы идёт respawn
#[test]
fn test_round_flow_elimination_and_respawn() {
    let mut app = create_combat_app(7);

    app.insert_resource(RoundSettings {
        rounds_to_win: 50, // матч не должен закончиться в этом тесте
        spawn_points: vec![
            (1, Vec3::new(-5.0, 0.0, 0.0)),
            (2, Vec3::new(5.0, 0.0, 0.0)),
        ],
        ..Default::default()
    });

    let (fighter1, fighter2) = spawn_duel(&mut app);

    // Гоняем до конца первого раунда (кто-то умирает)
    let mut round_over_seen = false;
    for _ in 0..20_000 {
        app.update();
        let state = app.world().resource::<MatchState>();
        if matches!(state.phase, MatchPhase::RoundOver { .. }) {
            round_over_seen = true;
            break;
        }
    }
    assert!(round_over_seen, "никто не умер за 20к тиков");

    // Одна из фракций получила очко
    let state = app.world().resource::<MatchState>();
    let total: u32 = state.scores.values().sum();
    assert_eq!(total, 1);

    // Ждём respawn (restart_delay = 3s → 192 тика + запас); проверяем
    // позиции сразу на тике respawn'а, пока бойцы не разбежались
    let mut respawned = false;
    for _ in 0..400 {
        app.update();
        if app.world().resource::<MatchState>().phase == MatchPhase::RoundActive {
            respawned = true;
            break;
        }
    }
    assert!(respawned, "respawn не случился");

    let state = app.world().resource::<MatchState>();
    assert_eq!(state.round, 2);

    // Оба бойца живы, на spawn точках, AI включен
    for (fighter, spawn_x) in [(fighter1, -5.0), (fighter2, 5.0)] {
        let world = app.world();
        let health = world.get::<Health>(fighter).expect("no Health");
        assert_eq!(health.current, health.max);
        assert!(world.get::<AiState>(fighter).is_some(), "AI не восстановлен");
        assert!(world.get::<skirmish_simulation::combat::Dead>(fighter).is_none());

        let transform = world.get::<Transform>(fighter).expect("no Transform");
        assert!(
            (transform.translation.x - spawn_x).abs() < 0.5,
            "боец не на spawn точке: {:?}",
            transform.translation
        );
    }
}

// --- Helpers ---

/// Инварианты: health/ammo в пределах, живые имеют ровно одно AI состояние
fn check_invariants(app: &mut App, fighter1: Entity, fighter2: Entity, tick: usize) {
    let world = app.world();

    for fighter in [fighter1, fighter2] {
        if let Some(health) = world.get::<Health>(fighter) {
            assert!(
                health.current <= health.max,
                "Tick {}: health invariant broken: {}/{}",
                tick,
                health.current,
                health.max
            );

            // Живой боец обязан иметь AiState (ровно одно состояние —
            // гарантировано типом), мёртвый — не иметь
            let has_state = world.get::<AiState>(fighter).is_some();
            if health.is_alive() {
                assert!(has_state, "Tick {}: живой боец без AiState", tick);
            }
        }

        if let Some(loadout) = world.get::<Loadout>(fighter) {
            assert!(
                loadout.bow.arrows <= loadout.bow.max_arrows,
                "Tick {}: ammo invariant broken",
                tick
            );
            assert!(
                loadout.cooldown_timer >= 0.0,
                "Tick {}: отрицательный cooldown",
                tick
            );
        }
    }
}

/// Запускает дуэль и возвращает snapshot (health + transforms + AI state)
fn run_duel_and_snapshot(seed: u64, ticks: usize) -> Vec<u8> {
    let mut app = create_combat_app(seed);
    spawn_duel(&mut app);

    for _ in 0..ticks {
        app.update();
    }

    let world = app.world_mut();
    let mut snapshot = world_snapshot::<Health>(world);
    snapshot.extend(world_snapshot::<Transform>(world));
    snapshot.extend(world_snapshot::<AiState>(world));
    snapshot
}
