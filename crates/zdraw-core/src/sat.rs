//! 分离轴定理（SAT）碰撞检测
//!
//! 用于凸多边形的重叠测试与最小平移向量（MTV）计算，服务于点击测试、
//! 框选以及仿真包围。
//!
//! 候选轴取每条边 `Pi − Pi+1` 的法向量，不做单位化，因此 MTV 的重叠深度
//! 以轴长度为尺度。需要单位推出方向时调用 [`MinimumTranslationVector::normalized`]。
//! 两个多边形不相交是正常结果（`Ok(false)` / `Ok(None)`），不是错误。

use crate::error::SatError;
use crate::math::{Point2, Vector2, VectorExt, EPSILON};

/// 顶点在某条轴上的投影区间
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub min: f64,
    pub max: f64,
}

impl Projection {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// 两区间是否重叠（端点接触视为重叠）
    pub fn overlaps(&self, other: &Projection) -> bool {
        !(self.min > other.max || other.min > self.max)
    }

    /// 本区间是否完全包含另一区间
    pub fn contains(&self, other: &Projection) -> bool {
        self.min <= other.min && self.max >= other.max
    }

    /// 重叠长度 `|max(min1, min2) − min(max1, max2)|`
    pub fn overlap(&self, other: &Projection) -> f64 {
        (self.min.max(other.min) - self.max.min(other.max)).abs()
    }
}

/// 最小平移向量
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimumTranslationVector {
    /// 重叠最小的轴（未单位化）
    pub axis: Vector2,
    /// 沿该轴的推出深度
    pub overlap: f64,
}

impl MinimumTranslationVector {
    /// 单位轴与按轴长换算后的深度
    pub fn normalized(&self) -> Option<MinimumTranslationVector> {
        let len = self.axis.norm();
        let axis = self.axis.normalized_or_none()?;
        Some(MinimumTranslationVector {
            axis,
            overlap: self.overlap / len,
        })
    }

    /// 推出位移向量（单位轴 × 深度）
    pub fn translation(&self) -> Option<Vector2> {
        self.normalized().map(|mtv| mtv.axis * mtv.overlap)
    }
}

fn check_polygon(vertices: &[Point2]) -> Result<(), SatError> {
    if vertices.len() < 3 {
        return Err(SatError::DegenerateInput(format!(
            "polygon needs at least 3 vertices, got {}",
            vertices.len()
        )));
    }
    Ok(())
}

/// 提取候选分离轴，每条边一条
pub fn axes(vertices: &[Point2]) -> Result<Vec<Vector2>, SatError> {
    check_polygon(vertices)?;

    let n = vertices.len();
    (0..n)
        .map(|i| {
            let edge = vertices[i] - vertices[(i + 1) % n];
            if edge.norm_squared() < EPSILON * EPSILON {
                return Err(SatError::DegenerateInput(format!(
                    "zero-length edge between vertices {} and {}",
                    i,
                    (i + 1) % n
                )));
            }
            Ok(edge.perpendicular())
        })
        .collect()
}

/// 顶点在轴上的投影
pub fn project(vertices: &[Point2], axis: &Vector2) -> Projection {
    vertices.iter().fold(
        Projection::new(f64::INFINITY, f64::NEG_INFINITY),
        |acc, v| {
            let d = axis.dot(&v.coords);
            Projection::new(acc.min.min(d), acc.max.max(d))
        },
    )
}

/// 两个区间是否重叠
pub fn projections_overlap(p1: &Projection, p2: &Projection) -> bool {
    p1.overlaps(p2)
}

/// 重叠测试：任一轴分离即返回 false
pub fn overlap(a: &[Point2], b: &[Point2]) -> Result<bool, SatError> {
    let axes_a = axes(a)?;
    let axes_b = axes(b)?;

    Ok(axes_a
        .iter()
        .chain(axes_b.iter())
        .all(|axis| project(a, axis).overlaps(&project(b, axis))))
}

fn sweep_mtv(
    a: &[Point2],
    b: &[Point2],
    containment: bool,
) -> Result<Option<MinimumTranslationVector>, SatError> {
    let axes_a = axes(a)?;
    let axes_b = axes(b)?;

    let mut best: Option<MinimumTranslationVector> = None;
    for axis in axes_a.iter().chain(axes_b.iter()) {
        let p1 = project(a, axis);
        let p2 = project(b, axis);
        if !p1.overlaps(&p2) {
            return Ok(None);
        }

        let mut depth = p1.overlap(&p2);
        if containment && (p1.contains(&p2) || p2.contains(&p1)) {
            let mins = (p1.min - p2.min).abs();
            let maxs = (p1.max - p2.max).abs();
            depth += mins.min(maxs);
        }

        if best.map_or(true, |m| depth < m.overlap) {
            best = Some(MinimumTranslationVector {
                axis: *axis,
                overlap: depth,
            });
        }
    }

    tracing::trace!(?best, containment, "sat mtv");
    Ok(best)
}

/// 最小平移向量；不相交时返回 `Ok(None)`
pub fn minimum_translation_vector(
    a: &[Point2],
    b: &[Point2],
) -> Result<Option<MinimumTranslationVector>, SatError> {
    sweep_mtv(a, b, false)
}

/// 考虑包含关系的最小平移向量
///
/// 一个投影完全包含另一个时，把 `|min1−min2|` 与 `|max1−max2|` 中较小者
/// 加到重叠深度上，避免嵌套时得到接近零的推出深度。
pub fn minimum_translation_vector_with_containment(
    a: &[Point2],
    b: &[Point2],
) -> Result<Option<MinimumTranslationVector>, SatError> {
    sweep_mtv(a, b, true)
}
