//! Sight backend — ray-intersection запросы для line-of-sight
//!
//! Boundary contract с engine слоем: perception'у нужен только
//! "ближайший hit по лучу против collision geometry". Production impl
//! оборачивает physics raycast хоста; built-in [`StaticGeometry`] —
//! headless замена (AABB блокеры, slab тест), по той же схеме что и
//! ручная collision resolution вместо физколлайдеров.

use bevy::prelude::*;

/// Фильтр слоёв для ray запроса (bitmask, default = все слои)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerMask(pub u32);

impl Default for LayerMask {
    fn default() -> Self {
        Self(u32::MAX)
    }
}

impl LayerMask {
    pub fn contains(&self, layer: u32) -> bool {
        self.0 & layer != 0
    }
}

/// Результат ray запроса: расстояние до ближайшего препятствия
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub distance: f32,
}

/// Ray-intersection запрос против collision geometry мира.
///
/// Возвращает ближайший hit в пределах max_distance, либо None.
/// `direction` должен быть нормализован.
pub trait SightBackend: Send + Sync {
    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit>;
}

/// Resource-обёртка над backend'ом (host заменяет на свой)
#[derive(Resource)]
pub struct SightService(pub Box<dyn SightBackend>);

impl Default for SightService {
    fn default() -> Self {
        // Пустая геометрия: всё видно всем
        Self(Box::new(StaticGeometry::default()))
    }
}

impl SightService {
    /// Есть ли препятствие на отрезке from → to
    pub fn segment_blocked(&self, from: Vec3, to: Vec3, mask: LayerMask) -> bool {
        let delta = to - from;
        let distance = delta.length();
        if distance <= f32::EPSILON {
            return false;
        }
        self.0.cast_ray(from, delta / distance, distance, mask).is_some()
    }
}

/// Axis-aligned блокер статической геометрии (стена, ящик)
#[derive(Debug, Clone, Copy)]
pub struct Blocker {
    pub min: Vec3,
    pub max: Vec3,
    /// Слой блокера (default 1)
    pub layer: u32,
}

impl Blocker {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max, layer: 1 }
    }

    /// Slab тест: ближайшее t вдоль луча, если луч пересекает AABB.
    ///
    /// Деление на нулевую компоненту даёт ±inf — slab метод это
    /// переживает без спец-ветвления.
    fn ray_distance(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<f32> {
        let inv = direction.recip();

        let t1 = (self.min - origin) * inv;
        let t2 = (self.max - origin) * inv;

        let t_min = t1.min(t2);
        let t_max = t1.max(t2);

        let near = t_min.x.max(t_min.y).max(t_min.z);
        let far = t_max.x.min(t_max.y).min(t_max.z);

        if near > far || far < 0.0 {
            return None;
        }

        // Луч стартует внутри блокера → hit на нулевой дистанции
        let hit = near.max(0.0);
        (hit <= max_distance).then_some(hit)
    }
}

/// Headless реализация sight backend'а: набор AABB блокеров
#[derive(Default)]
pub struct StaticGeometry {
    pub blockers: Vec<Blocker>,
}

impl StaticGeometry {
    pub fn new(blockers: Vec<Blocker>) -> Self {
        Self { blockers }
    }

    /// Стена между двумя точками (удобство для тестовых арен)
    pub fn with_wall(mut self, min: Vec3, max: Vec3) -> Self {
        self.blockers.push(Blocker::new(min, max));
        self
    }
}

impl SightBackend for StaticGeometry {
    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit> {
        let mut nearest: Option<f32> = None;

        for blocker in &self.blockers {
            if !mask.contains(blocker.layer) {
                continue;
            }

            if let Some(distance) = blocker.ray_distance(origin, direction, max_distance) {
                nearest = Some(match nearest {
                    Some(best) => best.min(distance),
                    None => distance,
                });
            }
        }

        nearest.map(|distance| RayHit { distance })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall() -> StaticGeometry {
        // Стена x∈[4,5], поперёк оси X на уровне глаз
        StaticGeometry::default().with_wall(Vec3::new(4.0, 0.0, -5.0), Vec3::new(5.0, 3.0, 5.0))
    }

    #[test]
    fn test_ray_hits_wall() {
        let geo = wall();
        let hit = geo.cast_ray(Vec3::new(0.0, 1.0, 0.0), Vec3::X, 20.0, LayerMask::default());
        assert!(hit.is_some());
        let hit = hit.unwrap();
        assert!((hit.distance - 4.0).abs() < 1e-4, "distance = {}", hit.distance);
    }

    #[test]
    fn test_ray_misses_wall() {
        let geo = wall();
        // Луч в противоположную сторону
        assert!(geo
            .cast_ray(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_X, 20.0, LayerMask::default())
            .is_none());
        // Луч над стеной
        assert!(geo
            .cast_ray(Vec3::new(0.0, 5.0, 0.0), Vec3::X, 20.0, LayerMask::default())
            .is_none());
    }

    #[test]
    fn test_ray_respects_max_distance() {
        let geo = wall();
        assert!(geo
            .cast_ray(Vec3::new(0.0, 1.0, 0.0), Vec3::X, 3.0, LayerMask::default())
            .is_none());
    }

    #[test]
    fn test_layer_mask_filters_blockers() {
        let mut geo = wall();
        geo.blockers[0].layer = 0b10;

        assert!(geo
            .cast_ray(Vec3::new(0.0, 1.0, 0.0), Vec3::X, 20.0, LayerMask(0b01))
            .is_none());
        assert!(geo
            .cast_ray(Vec3::new(0.0, 1.0, 0.0), Vec3::X, 20.0, LayerMask(0b10))
            .is_some());
    }

    #[test]
    fn test_segment_blocked() {
        let service = SightService(Box::new(wall()));
        let a = Vec3::new(0.0, 1.0, 0.0);
        let b = Vec3::new(10.0, 1.0, 0.0);
        assert!(service.segment_blocked(a, b, LayerMask::default()));
        // Короткий отрезок до стены — свободен
        assert!(!service.segment_blocked(a, Vec3::new(3.0, 1.0, 0.0), LayerMask::default()));
        // Вырожденный отрезок
        assert!(!service.segment_blocked(a, a, LayerMask::default()));
    }
}
