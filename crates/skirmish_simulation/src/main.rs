//! Headless симуляция SKIRMISH
//!
//! Запускает дуэль attacker vs defender без рендера: арена со стеной,
//! у защитника patrol маршрут. Для отладки AI и проверки детерминизма.

use bevy::prelude::*;

use skirmish_simulation::round::{MatchState, RoundSettings};
use skirmish_simulation::sight::{SightService, StaticGeometry};
use skirmish_simulation::*;

fn main() {
    let seed = 42;
    println!("Starting SKIRMISH headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);

    // Арена: стена в центре с проходом по южному краю
    app.insert_resource(SightService(Box::new(StaticGeometry::default().with_wall(
        Vec3::new(-1.0, 0.0, -6.0),
        Vec3::new(1.0, 3.0, 2.0),
    ))));

    app.insert_resource(RoundSettings {
        spawn_points: vec![
            (1, Vec3::new(-15.0, 0.0, 0.0)),
            (2, Vec3::new(15.0, 0.0, 0.0)),
        ],
        ..Default::default()
    });

    spawn_fighter(
        app.world_mut(),
        Vec3::new(-15.0, 0.0, 0.0),
        1,
        Role::Attacker,
        vec![Vec3::new(-8.0, 0.0, 0.0), Vec3::new(-2.0, 0.0, 5.0)],
    );
    spawn_fighter(
        app.world_mut(),
        Vec3::new(15.0, 0.0, 0.0),
        2,
        Role::Defender,
        vec![
            Vec3::new(15.0, 0.0, -8.0),
            Vec3::new(15.0, 0.0, 8.0),
            Vec3::new(8.0, 0.0, 0.0),
        ],
    );

    // ~47 секунд боя
    for tick in 0..3000 {
        app.update();

        if tick % 200 == 0 {
            let state = app.world().resource::<MatchState>();
            println!(
                "Tick {}: round {}, phase {:?}",
                tick, state.round, state.phase
            );
        }
    }

    let state = app.world().resource::<MatchState>();
    println!("Simulation complete: {:?}", state);
}

fn spawn_fighter(
    world: &mut World,
    position: Vec3,
    faction_id: u64,
    role: Role,
    patrol: Vec<Vec3>,
) -> Entity {
    world
        .spawn((
            Transform::from_translation(position),
            Actor { faction_id, role },
            AiState::default(),
            AiConfig::default(),
            AiTarget::default(),
            TargetMemory::default(),
            DecisionClock::default(),
            PatrolRoute::new(patrol),
            MovementCommand::default(),
            MovementInput::default(),
            MovementSpeed::default(),
            Loadout::default(),
            EquippedWeapon::default(),
            Shield::default(),
        ))
        .id()
}
