//! Combat system module
//!
//! ECS ответственность:
//! - Game state: Health, Loadout (cooldown, ammo), Shield stance
//! - Combat rules: swing окна, баллистика стрел, блок, урон
//! - События: MeleeSwingStarted, ArrowFired, DamageDealt, EntityDied
//!
//! Host engine ответственность:
//! - Анимации замаха/выстрела/блока, звуки, hit эффекты
//!   (presentation читает события, обратной связи нет)

use bevy::prelude::*;

pub mod damage;
pub mod melee;
pub mod projectile;
pub mod weapon;

// Re-export основных типов
pub use damage::{
    apply_damage, disable_ai_on_death, DamageDealt, DamageSource, Dead, EntityDied, HitLanded,
};
pub use melee::{MeleeSwing, MeleeSwingStarted};
pub use projectile::{Arrow, ArrowFired, BowDraw};
pub use weapon::{
    switch_weapon, tick_attack_cooldowns, tick_block_stance, BowWeapon, EquippedWeapon, Loadout,
    MeleeWeapon, Shield, WeaponKind, WeaponSwitched,
};

use crate::SimSet;

/// Combat Plugin
///
/// Порядок выполнения (chain внутри SimSet::Combat):
/// 1. tick_attack_cooldowns / tick_block_stance — таймеры
/// 2. start_melee_swings — открытие damage окон
/// 3. tick_melee_swings — удары мечом → HitLanded
/// 4. tick_bow_draws — натяжение лука → ArrowFired (или отмена)
/// 5. spawn_arrows / tick_arrows — стрелы → HitLanded
/// 6. apply_damage — HitLanded → Health → DamageDealt/EntityDied
/// 7. disable_ai_on_death — мертвые перестают действовать
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        // Регистрация событий
        app.add_event::<MeleeSwingStarted>()
            .add_event::<ArrowFired>()
            .add_event::<WeaponSwitched>()
            .add_event::<HitLanded>()
            .add_event::<DamageDealt>()
            .add_event::<EntityDied>();

        app.add_systems(
            FixedUpdate,
            (
                weapon::tick_attack_cooldowns,
                weapon::tick_block_stance,
                melee::start_melee_swings,
                melee::tick_melee_swings,
                projectile::tick_bow_draws,
                projectile::spawn_arrows,
                projectile::tick_arrows,
                damage::apply_damage,
                damage::disable_ai_on_death,
            )
                .chain()
                .in_set(SimSet::Combat),
        );
    }
}
