//! Weapon loadout — меч+щит и лук в одном kit'е
//!
//! Архитектура:
//! - ECS хранит: урон, cooldown, боезапас, block state (game state)
//! - Host engine исполняет: анимации замаха/выстрела, визуал смены
//!   оружия (читает WeaponSwitched / MeleeSwingStarted / ArrowFired)
//!
//! У актора один kit с обоими видами оружия; AI переключает активное
//! по дистанции до цели. Cooldown общий на kit — свежепереключённое
//! оружие не обнуляет откат.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Активное оружие актора
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Меч в руке, щит на предплечье
    #[default]
    SwordShield,
    /// Лук (меч за спиной)
    Bow,
}

/// Компонент: что сейчас в руках
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct EquippedWeapon {
    pub kind: WeaponKind,
}

impl EquippedWeapon {
    /// Сменить оружие; true если реально сменилось
    pub fn switch(&mut self, kind: WeaponKind) -> bool {
        if self.kind == kind {
            return false;
        }
        self.kind = kind;
        true
    }
}

/// Event: оружие сменилось (для presentation слоя)
#[derive(Event, Debug, Clone)]
pub struct WeaponSwitched {
    pub entity: Entity,
    pub kind: WeaponKind,
}

/// Helper: сменить оружие + событие для визуала
pub fn switch_weapon(
    entity: Entity,
    kind: WeaponKind,
    equipped: &mut EquippedWeapon,
    events: &mut EventWriter<WeaponSwitched>,
) {
    if equipped.switch(kind) {
        events.write(WeaponSwitched { entity, kind });
    }
}

/// Параметры меча
#[derive(Debug, Clone, Copy, Reflect, Serialize, Deserialize)]
pub struct MeleeWeapon {
    pub damage: u32,
    /// Дальность удара (метры)
    pub reach: f32,
    /// Длительность damage окна замаха (секунды)
    pub swing_duration: f32,
}

impl Default for MeleeWeapon {
    fn default() -> Self {
        Self {
            damage: 20,
            reach: 2.5,
            swing_duration: 0.4,
        }
    }
}

/// Параметры лука
#[derive(Debug, Clone, Copy, Reflect, Serialize, Deserialize)]
pub struct BowWeapon {
    pub damage: u32,
    /// Начальная скорость стрелы (м/с)
    pub arrow_speed: f32,
    /// Задержка между натяжением и вылетом стрелы (секунды)
    pub draw_delay: f32,
    /// Текущий боезапас
    pub arrows: u32,
    pub max_arrows: u32,
}

impl Default for BowWeapon {
    fn default() -> Self {
        Self {
            damage: 25,
            arrow_speed: 30.0,
            draw_delay: 1.1,
            arrows: 20,
            max_arrows: 20,
        }
    }
}

impl BowWeapon {
    pub fn has_arrows(&self) -> bool {
        self.arrows > 0
    }

    /// true если стрела была потрачена
    pub fn consume_arrow(&mut self) -> bool {
        if self.arrows == 0 {
            return false;
        }
        self.arrows -= 1;
        true
    }

    pub fn refill(&mut self) {
        self.arrows = self.max_arrows;
    }
}

/// Kit актора: меч + лук + общий attack cooldown
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Loadout {
    pub melee: MeleeWeapon,
    pub bow: BowWeapon,
    /// Cooldown между атаками (секунды)
    pub attack_cooldown: f32,
    /// Текущий cooldown таймер (уменьшается до 0)
    pub cooldown_timer: f32,
}

impl Default for Loadout {
    fn default() -> Self {
        Self {
            melee: MeleeWeapon::default(),
            bow: BowWeapon::default(),
            attack_cooldown: 1.0,
            cooldown_timer: 0.0,
        }
    }
}

impl Loadout {
    /// Может ли атаковать (cooldown == 0)
    pub fn can_attack(&self) -> bool {
        self.cooldown_timer <= 0.0
    }

    /// Начать cooldown после атаки
    pub fn start_cooldown(&mut self) {
        self.cooldown_timer = self.attack_cooldown;
    }

    /// Reset при respawn
    pub fn reset(&mut self) {
        self.cooldown_timer = 0.0;
        self.bow.refill();
    }
}

/// Щит: block stance + поглощение урона
///
/// blocking режет входящий урон на damage_reduction_percent и
/// замедляет движение. AI включает блок вероятностно в melee
/// (ai/systems/attack.rs), выключается сам по таймеру.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Shield {
    /// Процент поглощаемого урона при блоке
    pub damage_reduction_percent: f32,
    /// Множитель скорости движения при блоке
    pub block_move_multiplier: f32,

    pub blocking: bool,
    /// Сколько ещё держать блок (секунды)
    pub block_timer: f32,
    /// Сколько до разрешения следующего блока (секунды)
    pub retry_timer: f32,
}

impl Default for Shield {
    fn default() -> Self {
        Self {
            damage_reduction_percent: 50.0,
            block_move_multiplier: 0.4,
            blocking: false,
            block_timer: 0.0,
            retry_timer: 0.0,
        }
    }
}

impl Shield {
    pub fn can_start_block(&self) -> bool {
        !self.blocking && self.retry_timer <= 0.0
    }

    pub fn start_block(&mut self, duration: f32, cooldown: f32) {
        self.blocking = true;
        self.block_timer = duration;
        self.retry_timer = cooldown;
    }

    pub fn stop_block(&mut self) {
        self.blocking = false;
        self.block_timer = 0.0;
    }

    /// Множитель скорости с учётом текущего stance
    pub fn speed_multiplier(&self) -> f32 {
        if self.blocking {
            self.block_move_multiplier
        } else {
            1.0
        }
    }

    /// Сколько урона поглотится при текущем stance
    pub fn absorb(&self, damage: u32) -> u32 {
        if !self.blocking {
            return 0;
        }
        (damage as f32 * self.damage_reduction_percent / 100.0).round() as u32
    }

    /// Reset при respawn
    pub fn reset(&mut self) {
        self.blocking = false;
        self.block_timer = 0.0;
        self.retry_timer = 0.0;
    }
}

/// System: обновление attack cooldown таймеров
pub fn tick_attack_cooldowns(mut loadouts: Query<&mut Loadout>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();

    for mut loadout in loadouts.iter_mut() {
        if loadout.cooldown_timer > 0.0 {
            loadout.cooldown_timer = (loadout.cooldown_timer - delta).max(0.0);
        }
    }
}

/// System: таймеры block stance (авто-выход из блока по истечению)
pub fn tick_block_stance(mut shields: Query<&mut Shield>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();

    for mut shield in shields.iter_mut() {
        if shield.retry_timer > 0.0 {
            shield.retry_timer = (shield.retry_timer - delta).max(0.0);
        }

        if shield.blocking {
            shield.block_timer -= delta;
            if shield.block_timer <= 0.0 {
                shield.stop_block();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loadout_cooldown() {
        let mut loadout = Loadout::default();
        assert!(loadout.can_attack());

        loadout.start_cooldown();
        assert!(!loadout.can_attack());
        assert_eq!(loadout.cooldown_timer, 1.0);

        // Simulate tick
        loadout.cooldown_timer -= 0.5;
        assert!(!loadout.can_attack());

        loadout.cooldown_timer -= 0.5;
        assert!(loadout.can_attack());
    }

    #[test]
    fn test_bow_ammo() {
        let mut bow = BowWeapon::default();
        assert_eq!(bow.arrows, 20);

        for _ in 0..20 {
            assert!(bow.consume_arrow());
        }
        assert!(!bow.has_arrows());
        assert!(!bow.consume_arrow());

        bow.refill();
        assert_eq!(bow.arrows, bow.max_arrows);
    }

    #[test]
    fn test_shield_absorb() {
        let mut shield = Shield::default();

        // Без блока ничего не поглощается
        assert_eq!(shield.absorb(20), 0);
        assert_eq!(shield.speed_multiplier(), 1.0);

        shield.start_block(1.0, 3.0);
        assert_eq!(shield.absorb(20), 10); // 50%
        assert_eq!(shield.speed_multiplier(), 0.4);
        assert!(!shield.can_start_block());
    }

    #[test]
    fn test_weapon_switch_reports_change() {
        let mut equipped = EquippedWeapon::default();
        assert_eq!(equipped.kind, WeaponKind::SwordShield);

        assert!(equipped.switch(WeaponKind::Bow));
        assert!(!equipped.switch(WeaponKind::Bow)); // Уже в руках
        assert!(equipped.switch(WeaponKind::SwordShield));
    }
}
