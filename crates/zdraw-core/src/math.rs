//! 数学基础类型
//!
//! 点与向量直接使用 nalgebra 的二维类型，本模块补充编辑器常用的向量运算
//! （叉积、投影、反射、插值）以及轴对齐包围盒。

use serde::{Deserialize, Serialize};

pub type Point2 = nalgebra::Point2<f64>;
pub type Vector2 = nalgebra::Vector2<f64>;

/// 几何比较的默认容差
pub const EPSILON: f64 = 1e-10;

/// 二维向量的扩展运算
pub trait VectorExt: Sized {
    /// 二维叉积（z分量）
    fn cross_z(&self, other: &Self) -> f64;

    /// 左手法向量 (-y, x)
    fn perpendicular(&self) -> Self;

    /// 投影到另一向量上，目标为零向量时返回 None
    fn project_onto(&self, onto: &Self) -> Option<Self>;

    /// 关于法线反射（法线无需单位化）
    fn reflect(&self, normal: &Self) -> Option<Self>;

    /// 线性插值
    fn lerp_to(&self, other: &Self, t: f64) -> Self;

    /// 球面线性插值，按角度插值方向并线性插值长度
    fn slerp_to(&self, other: &Self, t: f64) -> Self;

    /// 单位化，长度过小时返回 None
    fn normalized_or_none(&self) -> Option<Self>;

    /// 两向量间的有向夹角（弧度，范围 (-π, π]）
    fn angle_between(&self, other: &Self) -> f64;
}

impl VectorExt for Vector2 {
    fn cross_z(&self, other: &Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    fn perpendicular(&self) -> Self {
        Vector2::new(-self.y, self.x)
    }

    fn project_onto(&self, onto: &Self) -> Option<Self> {
        let denom = onto.dot(onto);
        if denom < EPSILON * EPSILON {
            return None;
        }
        Some(onto * (self.dot(onto) / denom))
    }

    fn reflect(&self, normal: &Self) -> Option<Self> {
        let n = normal.normalized_or_none()?;
        Some(self - n * (2.0 * self.dot(&n)))
    }

    fn lerp_to(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t
    }

    fn slerp_to(&self, other: &Self, t: f64) -> Self {
        let (Some(a), Some(b)) = (self.normalized_or_none(), other.normalized_or_none()) else {
            return self.lerp_to(other, t);
        };

        let len = self.norm() + (other.norm() - self.norm()) * t;
        let theta = a.angle_between(&b) * t;
        let (sin, cos) = theta.sin_cos();
        Vector2::new(a.x * cos - a.y * sin, a.x * sin + a.y * cos) * len
    }

    fn normalized_or_none(&self) -> Option<Self> {
        self.try_normalize(EPSILON)
    }

    fn angle_between(&self, other: &Self) -> f64 {
        self.cross_z(other).atan2(self.dot(other))
    }
}

/// 二维轴对齐包围盒
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox2 {
    pub min: Point2,
    pub max: Point2,
}

impl BoundingBox2 {
    pub fn new(min: Point2, max: Point2) -> Self {
        Self { min, max }
    }

    /// 空包围盒（min > max），与任何点合并后变为该点
    pub fn empty() -> Self {
        Self {
            min: Point2::new(f64::MAX, f64::MAX),
            max: Point2::new(f64::MIN, f64::MIN),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Point2>) -> Self {
        let mut bbox = Self::empty();
        for p in points {
            bbox.expand_to_include(&p);
        }
        bbox
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn expand_to_include(&mut self, point: &Point2) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    pub fn union(&self, other: &BoundingBox2) -> BoundingBox2 {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        BoundingBox2::new(
            Point2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            Point2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        )
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point2 {
        Point2::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    pub fn contains(&self, point: &Point2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    pub fn intersects(&self, other: &BoundingBox2) -> bool {
        !(self.max.x < other.min.x
            || other.max.x < self.min.x
            || self.max.y < other.min.y
            || other.max.y < self.min.y)
    }

    /// 四个角点，按顺时针（y轴向下）顺序
    pub fn corners(&self) -> [Point2; 4] {
        [
            self.min,
            Point2::new(self.max.x, self.min.y),
            self.max,
            Point2::new(self.min.x, self.max.y),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_and_perpendicular() {
        let a = Vector2::new(1.0, 0.0);
        let b = Vector2::new(0.0, 1.0);
        assert!((a.cross_z(&b) - 1.0).abs() < EPSILON);
        assert!((b.cross_z(&a) + 1.0).abs() < EPSILON);
        assert_eq!(a.perpendicular(), Vector2::new(0.0, 1.0));
        assert!(a.perpendicular().dot(&a).abs() < EPSILON);
    }

    #[test]
    fn test_project_and_reflect() {
        let v = Vector2::new(3.0, 4.0);
        let p = v.project_onto(&Vector2::new(2.0, 0.0)).unwrap();
        assert!((p - Vector2::new(3.0, 0.0)).norm() < EPSILON);
        assert!(v.project_onto(&Vector2::zeros()).is_none());

        let r = Vector2::new(1.0, -1.0).reflect(&Vector2::new(0.0, 5.0)).unwrap();
        assert!((r - Vector2::new(1.0, 1.0)).norm() < EPSILON);
        assert!(v.reflect(&Vector2::zeros()).is_none());
    }

    #[test]
    fn test_lerp_slerp() {
        let a = Vector2::new(1.0, 0.0);
        let b = Vector2::new(0.0, 1.0);
        let mid = a.lerp_to(&b, 0.5);
        assert!((mid - Vector2::new(0.5, 0.5)).norm() < EPSILON);

        let s = a.slerp_to(&b, 0.5);
        let h = std::f64::consts::FRAC_1_SQRT_2;
        assert!((s - Vector2::new(h, h)).norm() < 1e-9);
        assert!((s.norm() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_zero_vector() {
        assert!(Vector2::zeros().normalized_or_none().is_none());
        let n = Vector2::new(0.0, 2.0).normalized_or_none().unwrap();
        assert!((n.norm() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_bounding_box() {
        let bbox = BoundingBox2::from_points([Point2::new(1.0, 5.0), Point2::new(-2.0, 3.0)]);
        assert_eq!(bbox.min, Point2::new(-2.0, 3.0));
        assert_eq!(bbox.max, Point2::new(1.0, 5.0));
        assert!(bbox.contains(&Point2::new(0.0, 4.0)));
        assert!(BoundingBox2::empty().is_empty());
        assert_eq!(BoundingBox2::empty().union(&bbox), bbox);
    }
}
