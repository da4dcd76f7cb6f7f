//! Perception — видимость цели (дистанция + sight cone + line of sight)
//!
//! Чистый запрос: дистанция и угол считаются из позиций/forward,
//! line of sight резолвится через SightService (engine boundary).
//! Side effects нет — TargetMemory обновляет вызывающая система.

use bevy::prelude::*;

use crate::ai::AiConfig;
use crate::sight::{LayerMask, SightService};

/// Видна ли цель из точки `agent_pos` со взглядом `forward`.
///
/// Три проверки по нарастающей стоимости:
/// 1. distance ≤ sight_range
/// 2. угол между forward и направлением на цель (в горизонтальной
///    плоскости) ≤ sight_angle / 2
/// 3. отрезок глаза-актора → грудь цели не перекрыт геометрией
pub fn can_see_target(
    agent_pos: Vec3,
    forward: Vec3,
    target_pos: Vec3,
    config: &AiConfig,
    sight: &SightService,
) -> bool {
    let to_target = target_pos - agent_pos;
    let distance = to_target.length();
    if distance > config.sight_range {
        return false;
    }

    let to_target_flat = Vec3::new(to_target.x, 0.0, to_target.z);
    let forward_flat = Vec3::new(forward.x, 0.0, forward.z);
    if to_target_flat.length_squared() <= f32::EPSILON
        || forward_flat.length_squared() <= f32::EPSILON
    {
        // Цель прямо над/под нами или forward вертикален — cone не определён
        return false;
    }

    let angle = forward_flat
        .normalize()
        .angle_between(to_target_flat.normalize())
        .to_degrees();
    if angle > config.sight_angle * 0.5 {
        return false;
    }

    // Raycast от глаз к груди цели
    let eye = agent_pos + Vec3::Y * config.eye_height;
    let target_point = target_pos + Vec3::Y * (config.eye_height * 0.6);
    !sight.segment_blocked(eye, target_point, LayerMask::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sight::StaticGeometry;

    fn open_field() -> SightService {
        SightService(Box::new(StaticGeometry::default()))
    }

    #[test]
    fn test_sees_target_in_front() {
        let config = AiConfig::default();
        let sight = open_field();

        assert!(can_see_target(
            Vec3::ZERO,
            Vec3::NEG_Z,
            Vec3::new(0.0, 0.0, -10.0),
            &config,
            &sight,
        ));
    }

    #[test]
    fn test_out_of_sight_range() {
        let config = AiConfig::default();
        let sight = open_field();

        // sight_range = 20
        assert!(!can_see_target(
            Vec3::ZERO,
            Vec3::NEG_Z,
            Vec3::new(0.0, 0.0, -25.0),
            &config,
            &sight,
        ));
    }

    #[test]
    fn test_outside_sight_cone() {
        let config = AiConfig::default();
        let sight = open_field();

        // sight_angle = 120 → half-angle 60°; цель сзади
        assert!(!can_see_target(
            Vec3::ZERO,
            Vec3::NEG_Z,
            Vec3::new(0.0, 0.0, 10.0),
            &config,
            &sight,
        ));

        // 45° от forward — внутри cone
        assert!(can_see_target(
            Vec3::ZERO,
            Vec3::NEG_Z,
            Vec3::new(5.0, 0.0, -5.0),
            &config,
            &sight,
        ));

        // ~80° от forward — снаружи
        assert!(!can_see_target(
            Vec3::ZERO,
            Vec3::NEG_Z,
            Vec3::new(10.0, 0.0, -1.5),
            &config,
            &sight,
        ));
    }

    #[test]
    fn test_wall_blocks_sight() {
        let config = AiConfig::default();
        // Стена поперёк луча на z = -5
        let sight = SightService(Box::new(StaticGeometry::default().with_wall(
            Vec3::new(-5.0, 0.0, -5.5),
            Vec3::new(5.0, 4.0, -5.0),
        )));

        assert!(!can_see_target(
            Vec3::ZERO,
            Vec3::NEG_Z,
            Vec3::new(0.0, 0.0, -10.0),
            &config,
            &sight,
        ));

        // Перед стеной — видно
        assert!(can_see_target(
            Vec3::ZERO,
            Vec3::NEG_Z,
            Vec3::new(0.0, 0.0, -4.0),
            &config,
            &sight,
        ));
    }
}
