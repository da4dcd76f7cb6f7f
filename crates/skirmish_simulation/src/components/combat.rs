//! Combat компоненты: loadout, экипированное оружие, щит

// NOTE: живут в crate::combat::weapon (рядом с combat системами)

pub use crate::combat::{BowWeapon, EquippedWeapon, Loadout, MeleeWeapon, Shield, WeaponKind};
