//! Базовые компоненты акторов: Actor, Role, Health

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Актор (боец) — базовый компонент для живых существ.
///
/// Автоматически добавляет Health через Required Components.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(Health)]
pub struct Actor {
    /// Stable ID фракции (противники = разные faction_id)
    pub faction_id: u64,
    /// Роль в раунде (defender приоритизирует bomb objective)
    pub role: Role,
}

/// Роль актора относительно objective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect, Serialize, Deserialize)]
pub enum Role {
    #[default]
    Attacker,
    Defender,
}

/// Здоровье актора
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100) // Default 100 HP
    }
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }

    pub fn heal(&mut self, amount: u32) {
        self.current = (self.current + amount).min(self.max);
    }

    /// Полный reset при respawn нового раунда
    pub fn reset(&mut self) {
        self.current = self.max;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_damage() {
        let mut health = Health::new(100);
        assert_eq!(health.current, 100);

        health.take_damage(30);
        assert_eq!(health.current, 70);
        assert!(health.is_alive());

        health.take_damage(100); // Saturating sub
        assert_eq!(health.current, 0);
        assert!(!health.is_alive());
    }

    #[test]
    fn test_health_heal_and_reset() {
        let mut health = Health::new(100);
        health.take_damage(50);

        health.heal(30);
        assert_eq!(health.current, 80);

        health.heal(100); // Clamped to max
        assert_eq!(health.current, 100);

        health.take_damage(99);
        health.reset();
        assert_eq!(health.current, health.max);
    }

    #[test]
    fn test_role_default_is_attacker() {
        assert_eq!(Role::default(), Role::Attacker);
    }
}
