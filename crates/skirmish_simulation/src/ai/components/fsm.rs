//! FSM AI components (state machine, config, память о цели, patrol route).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// AI FSM состояния.
///
/// Инвариант: ровно одно состояние активно; transitions считаются только
/// на decision tick, поведение состояния — каждый тик.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Component)]
pub enum AiState {
    /// Idle — начальное состояние, стоим и ждём
    #[default]
    Idle,

    /// Patrol — обход waypoint'ов по кругу
    Patrol,

    /// Chase — бежим к цели (или к bomb objective, если defender)
    Chase,

    /// Attack — навигация выключена, ручное сближение + удары/выстрелы
    Attack,

    /// Search — идём к last seen позиции цели
    Search,
}

/// Параметры AI (дистанции, тайминги, sight cone)
///
/// Пороговые множители (chase_reentry_factor, search_arrive_radius) —
/// осознанно конфигурируемые, не зашитые константы.
#[derive(Component, Debug, Clone, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct AiConfig {
    /// Радиус в котором цель вообще преследуется (метры)
    pub chase_range: f32,
    /// Дистанция ближнего боя (метры)
    pub melee_range: f32,
    /// Дистанция стрельбы из лука (метры)
    pub shoot_range: f32,
    /// Интервал между decision tick'ами (секунды)
    pub decision_interval: f32,

    /// Дальность зрения (метры)
    pub sight_range: f32,
    /// Полный угол sight cone (градусы)
    pub sight_angle: f32,
    /// Высота глаз над позицией актора (метры)
    pub eye_height: f32,
    /// Сколько секунд цель не видна прежде чем уйти в Search
    pub lose_target_time: f32,

    /// Attack → Chase только при distance > shoot_range × этот множитель
    /// (гистерезис против осцилляции на границе)
    pub chase_reentry_factor: f32,
    /// Радиус прибытия к last seen позиции в Search (метры)
    pub search_arrive_radius: f32,
    /// Радиус прибытия к patrol waypoint'у (метры)
    pub patrol_arrive_radius: f32,
    /// Спринт в Chase при distance > melee_range × этот множитель
    pub sprint_range_factor: f32,

    /// Допуск по углу (градусы) между forward и направлением на цель,
    /// в пределах которого разрешена атака
    pub facing_tolerance: f32,
    /// Предпочитаемый радиус "висения" около цели в melee (метры)
    pub melee_hover_radius: f32,
    /// Deadband вокруг hover радиуса (метры)
    pub melee_hover_deadband: f32,
    /// Скорость доворота на цель в Attack (slerp факторов в секунду)
    pub turn_rate: f32,

    /// Шанс начать блок щитом за секунду (melee sub-case)
    pub block_chance_per_second: f32,
    /// Случайная длительность блока (секунды, min..max)
    pub block_duration: (f32, f32),
    /// Случайный cooldown до следующего блока (секунды, min..max)
    pub block_cooldown: (f32, f32),
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            chase_range: 25.0,
            melee_range: 2.5,
            shoot_range: 12.0,
            decision_interval: 0.25,

            sight_range: 20.0,
            sight_angle: 120.0,
            eye_height: 1.6,
            lose_target_time: 3.0,

            chase_reentry_factor: 1.1,
            search_arrive_radius: 1.0,
            patrol_arrive_radius: 0.5,
            sprint_range_factor: 1.5,

            facing_tolerance: 25.0,
            melee_hover_radius: 2.0,
            melee_hover_deadband: 0.3,
            turn_rate: 10.0,

            block_chance_per_second: 0.35,
            block_duration: (0.6, 1.5),
            block_cooldown: (2.0, 4.0),
        }
    }
}

/// Текущая цель AI (weak ссылка — владение entity у мира)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct AiTarget {
    pub entity: Option<Entity>,
}

/// Память perception'а о цели.
///
/// Обновляется каждый тик из can_see результата; FSM читает на
/// decision tick'ах.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct TargetMemory {
    /// Секунды с момента когда цель была видна последний раз
    pub time_since_seen: f32,
    /// Позиция где цель видели последний раз (для Search)
    pub last_seen_position: Vec3,
    /// Результат can_see на текущем тике
    pub visible: bool,
}

impl Default for TargetMemory {
    fn default() -> Self {
        Self {
            // Цель ещё ни разу не видели
            time_since_seen: f32::INFINITY,
            last_seen_position: Vec3::ZERO,
            visible: false,
        }
    }
}

/// Таймер decision tick'а (countdown до следующей переоценки FSM)
///
/// Стартует с нуля — первый тик после спавна сразу принимает решение.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct DecisionClock {
    pub timer: f32,
}

/// Циклический маршрут патруля
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct PatrolRoute {
    pub points: Vec<Vec3>,
    pub index: usize,
}

impl PatrolRoute {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self { points, index: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn current(&self) -> Option<Vec3> {
        self.points.get(self.index).copied()
    }

    /// Перейти к следующему waypoint'у (циклично)
    pub fn advance(&mut self) {
        if !self.points.is_empty() {
            self.index = (self.index + 1) % self.points.len();
        }
    }
}
