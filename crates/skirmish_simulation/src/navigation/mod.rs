//! Navigation boundary — adapter над pathfinding'ом хоста
//!
//! Симуляция не считает пути сама: она даёт backend'у destination и
//! читает desired velocity / remaining distance. Production impl
//! оборачивает navmesh агент хоста; built-in [`DirectNav`] — движение
//! по прямой без обхода препятствий. Это осознанный degraded fallback:
//! работает хуже, но работает.

use bevy::prelude::*;
use std::collections::HashMap;

pub mod systems;

pub use systems::{apply_movement, resolve_movement_commands};

use crate::SimSet;

/// Pathfinding backend контракт (per-agent).
///
/// `desired_velocity` возвращает нормализованное направление — скорость
/// накладывает movement система (walk/sprint/block множители).
pub trait NavigationBackend: Send + Sync {
    /// Задать/обновить destination агента
    fn set_destination(&mut self, agent: Entity, from: Vec3, to: Vec3);

    /// Остановить агента и сбросить путь
    fn stop(&mut self, agent: Entity);

    /// Есть ли активный путь
    fn has_path(&self, agent: Entity) -> bool;

    /// Направление желаемого движения (ZERO если пути нет/прибыли)
    fn desired_velocity(&self, agent: Entity, from: Vec3) -> Vec3;

    /// Остаток пути до destination (INFINITY если пути нет)
    fn remaining_distance(&self, agent: Entity, from: Vec3) -> f32;
}

/// Resource-обёртка над backend'ом (host заменяет на свой)
#[derive(Resource)]
pub struct NavigationService(pub Box<dyn NavigationBackend>);

impl Default for NavigationService {
    fn default() -> Self {
        Self(Box::new(DirectNav::default()))
    }
}

/// Прямолинейный fallback backend: desired velocity = нормализованный
/// вектор на destination, никакого обхода препятствий.
#[derive(Default)]
pub struct DirectNav {
    destinations: HashMap<Entity, Vec3>,
}

/// Прибытие: ближе этого радиуса считаем что дошли
const ARRIVE_EPSILON: f32 = 0.05;

impl NavigationBackend for DirectNav {
    fn set_destination(&mut self, agent: Entity, _from: Vec3, to: Vec3) {
        self.destinations.insert(agent, to);
    }

    fn stop(&mut self, agent: Entity) {
        self.destinations.remove(&agent);
    }

    fn has_path(&self, agent: Entity) -> bool {
        self.destinations.contains_key(&agent)
    }

    fn desired_velocity(&self, agent: Entity, from: Vec3) -> Vec3 {
        let Some(destination) = self.destinations.get(&agent) else {
            return Vec3::ZERO;
        };

        let delta = Vec3::new(destination.x - from.x, 0.0, destination.z - from.z);
        if delta.length() <= ARRIVE_EPSILON {
            return Vec3::ZERO;
        }
        delta.normalize()
    }

    fn remaining_distance(&self, agent: Entity, from: Vec3) -> f32 {
        match self.destinations.get(&agent) {
            Some(destination) => Vec2::new(destination.x - from.x, destination.z - from.z).length(),
            None => f32::INFINITY,
        }
    }
}

/// Navigation Plugin: резолв команд + интеграция движения
pub struct NavigationPlugin;

impl Plugin for NavigationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (resolve_movement_commands, apply_movement)
                .chain()
                .in_set(SimSet::Navigation),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_nav_straight_line() {
        let mut nav = DirectNav::default();
        let agent = Entity::from_raw(1);

        assert!(!nav.has_path(agent));
        assert_eq!(nav.desired_velocity(agent, Vec3::ZERO), Vec3::ZERO);
        assert!(nav.remaining_distance(agent, Vec3::ZERO).is_infinite());

        nav.set_destination(agent, Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0));
        assert!(nav.has_path(agent));
        assert_eq!(nav.desired_velocity(agent, Vec3::ZERO), Vec3::X);
        assert_eq!(nav.remaining_distance(agent, Vec3::ZERO), 10.0);

        // Вертикаль игнорируется — strategic слой плоский
        let dir = nav.desired_velocity(agent, Vec3::new(0.0, 3.0, 0.0));
        assert_eq!(dir, Vec3::X);
    }

    #[test]
    fn test_direct_nav_arrival_and_stop() {
        let mut nav = DirectNav::default();
        let agent = Entity::from_raw(1);

        nav.set_destination(agent, Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        // На месте назначения velocity нулевая
        assert_eq!(nav.desired_velocity(agent, Vec3::new(1.0, 0.0, 0.0)), Vec3::ZERO);

        nav.stop(agent);
        assert!(!nav.has_path(agent));
    }
}
