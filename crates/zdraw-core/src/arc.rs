//! 椭圆弧参数化
//!
//! 圆弧段以端点形式描述（半径、x轴旋转、大弧标志、扫掠方向）。
//! 对只支持直线/三次曲线的后端，先转换为圆心参数化，
//! 再按不超过 90° 一段拆分为三次贝塞尔曲线。
//!
//! 参考 SVG 实现说明 B.2.4 "Conversion from endpoint to center parameterization"。

use crate::math::{Point2, Vector2};
use crate::path::{ArcSegment, SweepDirection};
use std::f64::consts::{FRAC_PI_2, PI};

/// 圆心参数化的椭圆弧
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterArc {
    pub center: Point2,
    /// 实际使用的半径（半径不足时已按比例放大）
    pub radii: Vector2,
    /// x 轴旋转（弧度）
    pub x_rotation: f64,
    /// 起始角（弧度，椭圆参数角）
    pub start_angle: f64,
    /// 扫掠角，正值为角度递增方向
    pub sweep_angle: f64,
}

impl CenterArc {
    /// 参数角对应的椭圆上的点
    pub fn point_at(&self, angle: f64) -> Point2 {
        let (sin_phi, cos_phi) = self.x_rotation.sin_cos();
        let (sin, cos) = angle.sin_cos();
        let x = self.radii.x * cos;
        let y = self.radii.y * sin;
        Point2::new(
            self.center.x + cos_phi * x - sin_phi * y,
            self.center.y + sin_phi * x + cos_phi * y,
        )
    }

    pub fn end_angle(&self) -> f64 {
        self.start_angle + self.sweep_angle
    }
}

/// 端点参数化转换结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArcParameterization {
    /// 正常椭圆弧
    Center(CenterArc),
    /// 半径为零，按直线连接两端点处理
    LineTo,
    /// 起点与终点重合，弧不绘制
    Omit,
}

/// 从端点参数化计算圆心参数化
pub fn center_parameterization(from: Point2, arc: &ArcSegment) -> ArcParameterization {
    let to = arc.point;
    if from == to {
        return ArcParameterization::Omit;
    }

    let mut rx = arc.size.width.abs();
    let mut ry = arc.size.height.abs();
    if rx * rx < f64::EPSILON || ry * ry < f64::EPSILON {
        return ArcParameterization::LineTo;
    }

    let positive_sweep = arc.sweep == SweepDirection::Clockwise;
    let phi = arc.rotation_angle.to_radians();
    let (sin_phi, cos_phi) = phi.sin_cos();

    // 平移到弦中点并旋转到椭圆轴方向
    let mid_x = (from.x - to.x) / 2.0;
    let mid_y = (from.y - to.y) / 2.0;
    let x1 = cos_phi * mid_x + sin_phi * mid_y;
    let y1 = -sin_phi * mid_x + cos_phi * mid_y;

    let lambda = (x1 / rx).powi(2) + (y1 / ry).powi(2);
    if lambda > 1.0 {
        let scale = lambda.sqrt();
        rx *= scale;
        ry *= scale;
    }

    let d = (rx * y1).powi(2) + (ry * x1).powi(2);
    if d == 0.0 {
        return ArcParameterization::Omit;
    }
    let mut k = ((rx * ry).powi(2) / d - 1.0).abs().sqrt();
    if positive_sweep == arc.is_large_arc {
        k = -k;
    }
    let cx1 = k * rx * y1 / ry;
    let cy1 = -k * ry * x1 / rx;

    let center = Point2::new(
        cos_phi * cx1 - sin_phi * cy1 + (from.x + to.x) / 2.0,
        sin_phi * cx1 + cos_phi * cy1 + (from.y + to.y) / 2.0,
    );

    let u = Vector2::new((x1 - cx1) / rx, (y1 - cy1) / ry);
    let v = Vector2::new((-x1 - cx1) / rx, (-y1 - cy1) / ry);
    let start_angle = u.y.atan2(u.x);
    let mut sweep_angle = (u.x * v.y - u.y * v.x).atan2(u.dot(&v));
    if positive_sweep && sweep_angle < 0.0 {
        sweep_angle += 2.0 * PI;
    } else if !positive_sweep && sweep_angle > 0.0 {
        sweep_angle -= 2.0 * PI;
    }

    ArcParameterization::Center(CenterArc {
        center,
        radii: Vector2::new(rx, ry),
        x_rotation: phi,
        start_angle,
        sweep_angle,
    })
}

/// 单段（≤ 90°）椭圆弧的三次贝塞尔近似，返回 `[c1, c2, end]`
fn arc_piece(arc: &CenterArc, th0: f64, th1: f64) -> [Point2; 3] {
    let (sin_phi, cos_phi) = arc.x_rotation.sin_cos();
    let (sin0, cos0) = th0.sin_cos();
    let (sin1, cos1) = th1.sin_cos();
    let (rx, ry) = (arc.radii.x, arc.radii.y);

    let half = 0.5 * (th1 - th0);
    let t = (8.0 / 3.0) * (half * 0.5).sin().powi(2) / half.sin();

    let to_world = |x: f64, y: f64| {
        Point2::new(
            arc.center.x + cos_phi * x - sin_phi * y,
            arc.center.y + sin_phi * x + cos_phi * y,
        )
    };

    let x3 = rx * cos1;
    let y3 = ry * sin1;
    [
        to_world(rx * (cos0 - t * sin0), ry * (sin0 + t * cos0)),
        to_world(x3 + rx * t * sin1, y3 - ry * t * cos1),
        to_world(x3, y3),
    ]
}

/// 将圆弧段近似为一组三次贝塞尔曲线
///
/// 每段扫掠不超过 90°。最后一段终点严格等于 `arc.point`。
/// 半径为零时返回一条等价直线的三次曲线，端点重合时返回空列表。
pub fn arc_to_cubics(from: Point2, arc: &ArcSegment) -> Vec<[Point2; 3]> {
    match center_parameterization(from, arc) {
        ArcParameterization::Omit => Vec::new(),
        ArcParameterization::LineTo => {
            let d = arc.point - from;
            vec![[from + d / 3.0, from + d * (2.0 / 3.0), arc.point]]
        }
        ArcParameterization::Center(center) => {
            let pieces = (center.sweep_angle.abs() / FRAC_PI_2 - 1e-9).ceil().max(1.0) as usize;
            let step = center.sweep_angle / pieces as f64;

            let mut cubics: Vec<[Point2; 3]> = (0..pieces)
                .map(|i| {
                    let th0 = center.start_angle + step * i as f64;
                    arc_piece(&center, th0, th0 + step)
                })
                .collect();
            if let Some(last) = cubics.last_mut() {
                last[2] = arc.point;
            }
            cubics
        }
    }
}
