//! 贝塞尔曲线工具
//!
//! - 二次到三次的升阶（精确重参数化，非近似）
//! - 曲线求值
//! - 按容差展平为折线

use crate::math::Point2;

const TWO_THIRDS: f64 = 2.0 / 3.0;

/// 展平时单条曲线的最大分段数
const MAX_FLATTEN_STEPS: usize = 256;

/// 三次贝塞尔曲线的两个控制点（端点与原曲线相同）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicControls {
    pub c1: Point2,
    pub c2: Point2,
}

/// 二次贝塞尔升阶为三次
///
/// `C1 = P0 + 2/3 (P1 − P0)`，`C2 = P2 + 2/3 (P1 − P2)`，端点不变。
pub fn elevate_quadratic(p0: Point2, p1: Point2, p2: Point2) -> CubicControls {
    CubicControls {
        c1: p0 + (p1 - p0) * TWO_THIRDS,
        c2: p2 + (p1 - p2) * TWO_THIRDS,
    }
}

/// 连续二次曲线升阶
///
/// `points` 按 (控制点, 终点) 成对排列，每段以前一段终点作为新的 P0。
/// 返回每段的 `[c1, c2, end]`。奇数个点时末尾的孤立点被忽略，调用方应先校验。
pub fn elevate_poly_quadratic(start: Point2, points: &[Point2]) -> Vec<[Point2; 3]> {
    let mut current = start;
    points
        .chunks_exact(2)
        .map(|pair| {
            let controls = elevate_quadratic(current, pair[0], pair[1]);
            current = pair[1];
            [controls.c1, controls.c2, pair[1]]
        })
        .collect()
}

/// 二次贝塞尔曲线在 t 处的点
pub fn quadratic_point(p0: Point2, p1: Point2, p2: Point2, t: f64) -> Point2 {
    let mt = 1.0 - t;
    Point2::from(p0.coords * (mt * mt) + p1.coords * (2.0 * mt * t) + p2.coords * (t * t))
}

/// 三次贝塞尔曲线在 t 处的点
pub fn cubic_point(p0: Point2, p1: Point2, p2: Point2, p3: Point2, t: f64) -> Point2 {
    let mt = 1.0 - t;
    Point2::from(
        p0.coords * (mt * mt * mt)
            + p1.coords * (3.0 * mt * mt * t)
            + p2.coords * (3.0 * mt * t * t)
            + p3.coords * (t * t * t),
    )
}

fn flatten_steps(scale: f64, second_difference: f64, tolerance: f64) -> usize {
    if tolerance <= 0.0 || !tolerance.is_finite() {
        return MAX_FLATTEN_STEPS;
    }
    let n = (scale * second_difference / tolerance).sqrt().ceil();
    (n as usize).clamp(1, MAX_FLATTEN_STEPS)
}

/// 展平二次曲线，向 `out` 追加除起点外的采样点
pub fn flatten_quadratic(p0: Point2, p1: Point2, p2: Point2, tolerance: f64, out: &mut Vec<Point2>) {
    let dd = (p0.coords - p1.coords * 2.0 + p2.coords).norm();
    let steps = flatten_steps(0.25, dd, tolerance);
    for i in 1..steps {
        out.push(quadratic_point(p0, p1, p2, i as f64 / steps as f64));
    }
    out.push(p2);
}

/// 展平三次曲线，向 `out` 追加除起点外的采样点
pub fn flatten_cubic(
    p0: Point2,
    p1: Point2,
    p2: Point2,
    p3: Point2,
    tolerance: f64,
    out: &mut Vec<Point2>,
) {
    let dd1 = (p0.coords - p1.coords * 2.0 + p2.coords).norm();
    let dd2 = (p1.coords - p2.coords * 2.0 + p3.coords).norm();
    let steps = flatten_steps(0.75, dd1.max(dd2), tolerance);
    for i in 1..steps {
        out.push(cubic_point(p0, p1, p2, p3, i as f64 / steps as f64));
    }
    out.push(p3);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elevate_symmetric_quadratic() {
        let p0 = Point2::new(0.0, 0.0);
        let p1 = Point2::new(1.0, 2.0);
        let p2 = Point2::new(2.0, 0.0);

        let c = elevate_quadratic(p0, p1, p2);
        let eps = 4.0 * f64::EPSILON;
        assert!((c.c1.x - 2.0 / 3.0).abs() <= eps);
        assert!((c.c1.y - 4.0 / 3.0).abs() <= eps);
        assert!((c.c2.x - 4.0 / 3.0).abs() <= eps);
        assert!((c.c2.y - 4.0 / 3.0).abs() <= eps);

        for t in [0.0, 0.5, 1.0] {
            let q = quadratic_point(p0, p1, p2, t);
            let k = cubic_point(p0, c.c1, c.c2, p2, t);
            assert!((q - k).norm() < 1e-9, "t = {t}: {q} vs {k}");
        }
    }

    #[test]
    fn test_elevation_matches_on_dense_samples() {
        let p0 = Point2::new(-3.0, 7.5);
        let p1 = Point2::new(10.25, -4.0);
        let p2 = Point2::new(2.0, 1.0);
        let c = elevate_quadratic(p0, p1, p2);
        for i in 0..=64 {
            let t = i as f64 / 64.0;
            let q = quadratic_point(p0, p1, p2, t);
            let k = cubic_point(p0, c.c1, c.c2, p2, t);
            assert!((q - k).norm() < 1e-9);
        }
    }

    #[test]
    fn test_elevate_poly_quadratic_chains_end_points() {
        let start = Point2::new(0.0, 0.0);
        let points = [
            Point2::new(1.0, 2.0),
            Point2::new(2.0, 0.0),
            Point2::new(3.0, -2.0),
            Point2::new(4.0, 0.0),
        ];
        let cubics = elevate_poly_quadratic(start, &points);
        assert_eq!(cubics.len(), 2);

        let second = elevate_quadratic(points[1], points[2], points[3]);
        assert_eq!(cubics[1], [second.c1, second.c2, points[3]]);
        assert_eq!(cubics[0][2], points[1]);
    }

    #[test]
    fn test_flatten_ends_on_end_point() {
        let mut out = Vec::new();
        flatten_cubic(
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 10.0),
            Point2::new(10.0, 10.0),
            Point2::new(10.0, 0.0),
            0.01,
            &mut out,
        );
        assert!(out.len() > 4);
        assert_eq!(*out.last().unwrap(), Point2::new(10.0, 0.0));
    }
}
