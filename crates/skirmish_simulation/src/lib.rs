//! SKIRMISH Simulation Core
//!
//! ECS-симуляция раундового 1v1 боя (strategic layer) на Bevy 0.16.
//!
//! HYBRID ARCHITECTURE:
//! - ECS = strategic layer (AI FSM, combat rules, round flow)
//! - Host engine = tactical layer (rendering, animation, physics, navmesh)
//!
//! Границы с engine слоем выражены двумя способами:
//! - trait-объекты за resources ([`navigation::NavigationService`],
//!   [`sight::SightService`]) — production impl живёт на стороне engine,
//!   built-in headless impl является degraded fallback'ом
//! - events (`MeleeSwingStarted`, `ArrowFired`, `WeaponSwitched`, round
//!   events) — presentation слой читает их для анимаций/UI, обратной
//!   связи в симуляцию нет

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

// Публичные модули
pub mod ai;
pub mod combat;
pub mod components;
pub mod logger;
pub mod navigation;
pub mod round;
pub mod sight;

// Re-export базовых типов для удобства
pub use ai::{AiConfig, AiPlugin, AiState};
pub use combat::{
    ArrowFired, CombatPlugin, DamageDealt, DamageSource, Dead, EntityDied, HitLanded,
    MeleeSwingStarted, WeaponSwitched,
};
pub use components::*;
pub use logger::{init_logger, log, log_error, log_info, log_warning, LogLevel, LogPrinter};
pub use navigation::{NavigationPlugin, NavigationService};
pub use round::{MatchState, RoundPlugin, RoundSettings};
pub use sight::SightService;

/// Fixed timestep симуляции: 64Hz = ровно 15625 микросекунд.
/// Степень двойки — накопитель fixed времени не дрейфует на float ошибках.
pub const TICK: Duration = Duration::from_micros(15625);

/// Длительность одного тика в секундах (для расчётов в тестах)
pub const TICK_SECONDS: f32 = 0.015625;

/// Порядок фаз симуляции внутри FixedUpdate.
///
/// Жёсткая последовательность вместо произвольного порядка плагинов —
/// иначе детерминизм ломается на межплагинных гонках.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimSet {
    /// Выбор цели + обновление памяти о ней (видимость, last seen)
    Perception,
    /// FSM transitions (только на decision tick)
    Decision,
    /// Поведение активного состояния → MovementCommand / атаки
    Behavior,
    /// MovementCommand → velocity → интеграция Transform
    Navigation,
    /// Cooldowns, swing окна, полёт стрел, урон, смерть
    Combat,
    /// Bomb objective + счёт раундов/матча
    Round,
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 64Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_duration(TICK))
            // Детерминистичный RNG (seed по умолчанию; уже вставленный
            // seeded resource не затирается)
            .init_resource::<DeterministicRng>()
            // Degraded fallback'и для engine сервисов (host может заменить)
            .init_resource::<NavigationService>()
            .init_resource::<SightService>()
            .configure_sets(
                FixedUpdate,
                (
                    SimSet::Perception,
                    SimSet::Decision,
                    SimSet::Behavior,
                    SimSet::Navigation,
                    SimSet::Combat,
                    SimSet::Round,
                )
                    .chain(),
            )
            // Подсистемы (ECS strategic layer)
            .add_plugins((AiPlugin, NavigationPlugin, CombatPlugin, RoundPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
///
/// Вся случайность симуляции (block stance AI) тянется отсюда,
/// не из thread_rng — иначе replay с тем же seed расходится.
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Создаёт minimal Bevy App для headless симуляции.
///
/// TimeUpdateStrategy::ManualDuration: каждый `App::update` продвигает
/// часы ровно на один TICK — прогон не зависит от wall clock.
/// (Первый update — startup, delta нулевая и fixed тиков не даёт.)
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(TICK))
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_duration(TICK));

    app
}

/// Snapshot мира для сравнения детерминизма
/// (упрощённая версия — Debug формат, сортировка по Entity ID)
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
