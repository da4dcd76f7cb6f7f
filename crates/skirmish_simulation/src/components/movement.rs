//! Movement компоненты: команды навигации, движение, скорость

use bevy::prelude::*;

/// Команда движения для актора (high-level intent)
///
/// Архитектура:
/// - AI behavior системы пишут MovementCommand
/// - navigation система резолвит её через NavigationService в MovementInput
/// - Исключение: в Attack state актор рулит вручную, команда = Idle,
///   и navigation система его не трогает
#[derive(Component, Debug, Clone, PartialEq)]
pub enum MovementCommand {
    /// Стоять на месте (навигация остановлена, путь сброшен)
    Idle,
    /// Двигаться к позиции (world coordinates)
    MoveTo { target: Vec3 },
    /// Следовать за entity (destination обновляется каждый тик)
    Follow { target: Entity },
}

impl Default for MovementCommand {
    fn default() -> Self {
        Self::Idle
    }
}

/// Желаемое движение на текущий тик (world-space)
///
/// Пишется navigation системой (из desired velocity backend'а) либо
/// напрямую Attack поведением. Интегрируется apply_movement.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct MovementInput {
    /// Нормализованное направление (Y всегда 0 — strategic слой плоский,
    /// вертикаль принадлежит engine физике)
    pub direction: Vec3,
    /// Бежать спринтом
    pub sprint: bool,
    /// Точка на которую доворачиваться (Attack state целится в цель).
    /// None → актор разворачивается по направлению движения.
    pub face_toward: Option<Vec3>,
}

impl MovementInput {
    pub fn clear(&mut self) {
        self.direction = Vec3::ZERO;
        self.sprint = false;
        self.face_toward = None;
    }
}

/// Скорости движения актора (метры/сек)
#[derive(Component, Clone, Copy, Debug)]
pub struct MovementSpeed {
    pub walk: f32,
    pub sprint: f32,
}

impl Default for MovementSpeed {
    fn default() -> Self {
        Self {
            walk: 6.0,
            sprint: 10.0,
        }
    }
}

impl MovementSpeed {
    pub fn current(&self, sprinting: bool) -> f32 {
        if sprinting {
            self.sprint
        } else {
            self.walk
        }
    }
}
