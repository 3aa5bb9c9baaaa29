//! 图形定义
//!
//! 渲染器按图形种类分别绘制（见渲染契约 `ShapeRenderer`）。
//! 曲线类图形通过构建协议生成 `PathGeometry`，再交给后端转换器。

use crate::math::{BoundingBox2, Point2, Vector2};
use crate::path::{FillRule, PathFigure, PathGeometry, PathSize, Segment, SweepDirection};
use crate::properties::ShapeStyle;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SHAPE_ID: AtomicU64 = AtomicU64::new(1);

/// 单图形的非零填充几何
fn single_figure(start: Point2, is_filled: bool, is_closed: bool, segments: Vec<Segment>) -> PathGeometry {
    PathGeometry::from_figures(
        FillRule::NonZero,
        vec![PathFigure::with_segments(start, is_filled, is_closed, segments)],
    )
}

/// 图形唯一标识，用于渲染缓存
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShapeId(u64);

impl ShapeId {
    pub fn new() -> Self {
        Self(NEXT_SHAPE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ShapeId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointShape {
    pub id: ShapeId,
    pub position: Point2,
    pub style: Option<ShapeStyle>,
}

impl PointShape {
    pub fn new(position: Point2) -> Self {
        Self {
            id: ShapeId::new(),
            position,
            style: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineShape {
    pub id: ShapeId,
    pub start: Point2,
    pub end: Point2,
    pub style: Option<ShapeStyle>,
}

impl LineShape {
    pub fn new(start: Point2, end: Point2) -> Self {
        Self {
            id: ShapeId::new(),
            start,
            end,
            style: None,
        }
    }

    pub fn to_geometry(&self) -> PathGeometry {
        single_figure(self.start, false, false, vec![Segment::line(self.end)])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RectangleShape {
    pub id: ShapeId,
    pub bounds: BoundingBox2,
    pub style: Option<ShapeStyle>,
}

impl RectangleShape {
    pub fn new(corner1: Point2, corner2: Point2) -> Self {
        Self {
            id: ShapeId::new(),
            bounds: BoundingBox2::from_points([corner1, corner2]),
            style: None,
        }
    }

    pub fn to_geometry(&self) -> PathGeometry {
        let [first, rest @ ..] = self.bounds.corners();
        single_figure(first, true, true, vec![Segment::poly_line(rest.to_vec())])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EllipseShape {
    pub id: ShapeId,
    pub bounds: BoundingBox2,
    pub style: Option<ShapeStyle>,
}

impl EllipseShape {
    pub fn new(corner1: Point2, corner2: Point2) -> Self {
        Self {
            id: ShapeId::new(),
            bounds: BoundingBox2::from_points([corner1, corner2]),
            style: None,
        }
    }

    /// 以两段半椭圆弧构建闭合路径
    pub fn to_geometry(&self) -> PathGeometry {
        let c = self.bounds.center();
        let radii = PathSize::new(self.bounds.width() / 2.0, self.bounds.height() / 2.0);
        let left = Point2::new(self.bounds.min.x, c.y);
        let right = Point2::new(self.bounds.max.x, c.y);

        single_figure(
            left,
            true,
            true,
            vec![
                Segment::arc(right, radii, 0.0, false, SweepDirection::Clockwise),
                Segment::arc(left, radii, 0.0, false, SweepDirection::Clockwise),
            ],
        )
    }
}

/// 椭圆弧图形（圆心参数化，角度为弧度）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArcShape {
    pub id: ShapeId,
    pub center: Point2,
    pub radii: PathSize,
    pub start_angle: f64,
    /// 正值为角度递增方向（屏幕坐标系中的顺时针）
    pub sweep_angle: f64,
    pub style: Option<ShapeStyle>,
}

impl ArcShape {
    pub fn new(center: Point2, radii: PathSize, start_angle: f64, sweep_angle: f64) -> Self {
        Self {
            id: ShapeId::new(),
            center,
            radii,
            start_angle,
            sweep_angle,
            style: None,
        }
    }

    pub fn point_at(&self, angle: f64) -> Point2 {
        Point2::new(
            self.center.x + self.radii.width * angle.cos(),
            self.center.y + self.radii.height * angle.sin(),
        )
    }

    /// 转换为端点参数化的开放路径
    ///
    /// 满周扫掠拆成两段，因为端点重合的弧不会被绘制。
    pub fn to_geometry(&self) -> PathGeometry {
        let sweep = self.sweep_angle.clamp(-TAU, TAU);
        let direction = if sweep >= 0.0 {
            SweepDirection::Clockwise
        } else {
            SweepDirection::CounterClockwise
        };

        let pieces = if sweep.abs() > PI { 2 } else { 1 };
        let step = sweep / pieces as f64;
        let segments = (1..=pieces)
            .map(|i| {
                let end = self.point_at(self.start_angle + step * i as f64);
                Segment::arc(end, self.radii, 0.0, false, direction)
            })
            .collect();
        single_figure(self.point_at(self.start_angle), false, false, segments)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CubicBezierShape {
    pub id: ShapeId,
    pub p0: Point2,
    pub p1: Point2,
    pub p2: Point2,
    pub p3: Point2,
    pub style: Option<ShapeStyle>,
}

impl CubicBezierShape {
    pub fn new(p0: Point2, p1: Point2, p2: Point2, p3: Point2) -> Self {
        Self {
            id: ShapeId::new(),
            p0,
            p1,
            p2,
            p3,
            style: None,
        }
    }

    pub fn to_geometry(&self) -> PathGeometry {
        single_figure(self.p0, false, false, vec![Segment::cubic(self.p1, self.p2, self.p3)])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuadraticBezierShape {
    pub id: ShapeId,
    pub p0: Point2,
    pub p1: Point2,
    pub p2: Point2,
    pub style: Option<ShapeStyle>,
}

impl QuadraticBezierShape {
    pub fn new(p0: Point2, p1: Point2, p2: Point2) -> Self {
        Self {
            id: ShapeId::new(),
            p0,
            p1,
            p2,
            style: None,
        }
    }

    pub fn to_geometry(&self) -> PathGeometry {
        single_figure(self.p0, false, false, vec![Segment::quadratic(self.p1, self.p2)])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextShape {
    pub id: ShapeId,
    pub position: Point2,
    pub content: String,
    pub height: f64,
    pub style: Option<ShapeStyle>,
}

impl TextShape {
    pub fn new(position: Point2, content: impl Into<String>, height: f64) -> Self {
        Self {
            id: ShapeId::new(),
            position,
            content: content.into(),
            height,
            style: None,
        }
    }

    /// 估算包围盒（字符宽度按高度的 0.6 倍计）
    pub fn bounding_box(&self) -> BoundingBox2 {
        let width = self.content.chars().count() as f64 * self.height * 0.6;
        BoundingBox2::new(
            self.position,
            self.position + Vector2::new(width, self.height),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageShape {
    pub id: ShapeId,
    pub bounds: BoundingBox2,
    /// 图像缓存中的键
    pub key: String,
    pub style: Option<ShapeStyle>,
}

impl ImageShape {
    pub fn new(corner1: Point2, corner2: Point2, key: impl Into<String>) -> Self {
        Self {
            id: ShapeId::new(),
            bounds: BoundingBox2::from_points([corner1, corner2]),
            key: key.into(),
            style: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathShape {
    pub id: ShapeId,
    pub geometry: PathGeometry,
    pub style: Option<ShapeStyle>,
}

impl PathShape {
    pub fn new(geometry: PathGeometry) -> Self {
        Self {
            id: ShapeId::new(),
            geometry,
            style: None,
        }
    }
}

/// 所有图形种类
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Shape {
    Point(PointShape),
    Line(LineShape),
    Rectangle(RectangleShape),
    Ellipse(EllipseShape),
    Arc(ArcShape),
    CubicBezier(CubicBezierShape),
    QuadraticBezier(QuadraticBezierShape),
    Text(TextShape),
    Image(ImageShape),
    Path(PathShape),
}

impl Shape {
    pub fn id(&self) -> ShapeId {
        match self {
            Shape::Point(s) => s.id,
            Shape::Line(s) => s.id,
            Shape::Rectangle(s) => s.id,
            Shape::Ellipse(s) => s.id,
            Shape::Arc(s) => s.id,
            Shape::CubicBezier(s) => s.id,
            Shape::QuadraticBezier(s) => s.id,
            Shape::Text(s) => s.id,
            Shape::Image(s) => s.id,
            Shape::Path(s) => s.id,
        }
    }

    /// 图形自身的样式
    pub fn style(&self) -> Option<&ShapeStyle> {
        match self {
            Shape::Point(s) => s.style.as_ref(),
            Shape::Line(s) => s.style.as_ref(),
            Shape::Rectangle(s) => s.style.as_ref(),
            Shape::Ellipse(s) => s.style.as_ref(),
            Shape::Arc(s) => s.style.as_ref(),
            Shape::CubicBezier(s) => s.style.as_ref(),
            Shape::QuadraticBezier(s) => s.style.as_ref(),
            Shape::Text(s) => s.style.as_ref(),
            Shape::Image(s) => s.style.as_ref(),
            Shape::Path(s) => s.style.as_ref(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Shape::Point(_) => "Point",
            Shape::Line(_) => "Line",
            Shape::Rectangle(_) => "Rectangle",
            Shape::Ellipse(_) => "Ellipse",
            Shape::Arc(_) => "Arc",
            Shape::CubicBezier(_) => "CubicBezier",
            Shape::QuadraticBezier(_) => "QuadraticBezier",
            Shape::Text(_) => "Text",
            Shape::Image(_) => "Image",
            Shape::Path(_) => "Path",
        }
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        match self {
            Shape::Point(s) => BoundingBox2::new(s.position, s.position),
            Shape::Line(s) => BoundingBox2::from_points([s.start, s.end]),
            Shape::Rectangle(s) => s.bounds,
            Shape::Ellipse(s) => s.bounds,
            Shape::Arc(s) => s.to_geometry().bounding_box(),
            Shape::CubicBezier(s) => BoundingBox2::from_points([s.p0, s.p1, s.p2, s.p3]),
            Shape::QuadraticBezier(s) => BoundingBox2::from_points([s.p0, s.p1, s.p2]),
            Shape::Text(s) => s.bounding_box(),
            Shape::Image(s) => s.bounds,
            Shape::Path(s) => s.geometry.bounding_box(),
        }
    }

    /// 轮廓多边形，每个图形一个，供 SAT 碰撞检测使用
    ///
    /// SAT 只对凸多边形成立；曲线图形取展平后的折线，非凸时结果偏保守。
    /// 多图形路径的各子路径分别给出，不会在图形之间连出虚假的边。
    pub fn outlines(&self, tolerance: f64) -> Vec<Vec<Point2>> {
        let from_geometry = |g: &PathGeometry| {
            g.figures
                .iter()
                .map(|f| f.to_polygon(tolerance))
                .collect::<Vec<_>>()
        };
        match self {
            Shape::Point(s) => vec![vec![s.position]],
            Shape::Line(s) => vec![vec![s.start, s.end]],
            Shape::Rectangle(s) => vec![s.bounds.corners().to_vec()],
            Shape::Ellipse(s) => from_geometry(&s.to_geometry()),
            Shape::Arc(s) => from_geometry(&s.to_geometry()),
            Shape::CubicBezier(s) => from_geometry(&s.to_geometry()),
            Shape::QuadraticBezier(s) => from_geometry(&s.to_geometry()),
            Shape::Text(s) => vec![s.bounding_box().corners().to_vec()],
            Shape::Image(s) => vec![s.bounds.corners().to_vec()],
            Shape::Path(s) => from_geometry(&s.geometry),
        }
    }
}

macro_rules! impl_with_style {
    ($($ty:ident),*) => {
        $(
            impl $ty {
                pub fn with_style(mut self, style: ShapeStyle) -> Self {
                    self.style = Some(style);
                    self
                }
            }
        )*
    };
}

impl_with_style!(
    PointShape,
    LineShape,
    RectangleShape,
    EllipseShape,
    ArcShape,
    CubicBezierShape,
    QuadraticBezierShape,
    TextShape,
    ImageShape,
    PathShape
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Segment;
    use crate::sat;

    #[test]
    fn test_shape_ids_are_unique() {
        let a = PointShape::new(Point2::origin());
        let b = PointShape::new(Point2::origin());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_full_arc_is_split() {
        let arc = ArcShape::new(Point2::origin(), PathSize::new(2.0, 2.0), 0.0, TAU);
        let geometry = arc.to_geometry();
        let segments = &geometry.figures[0].segments;
        assert_eq!(segments.len(), 2);
        assert!(segments.iter().all(|s| matches!(s, Segment::Arc(_))));
        assert!((geometry.figures[0].end_point() - Point2::new(2.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn test_rectangle_geometry_is_closed_polygon() {
        let rect = RectangleShape::new(Point2::new(2.0, 1.0), Point2::new(0.0, 0.0));
        let geometry = rect.to_geometry();
        let figure = &geometry.figures[0];
        assert!(figure.is_closed);
        assert_eq!(figure.start_point, Point2::new(0.0, 0.0));
        assert_eq!(figure.to_polygon(0.1).len(), 4);
    }

    #[test]
    fn test_ellipse_outline_overlaps_rectangle() {
        let ellipse = Shape::Ellipse(EllipseShape::new(Point2::new(0.0, 0.0), Point2::new(4.0, 2.0)));
        let inside = Shape::Rectangle(RectangleShape::new(Point2::new(1.5, 0.5), Point2::new(2.5, 1.5)));
        let corner = Shape::Rectangle(RectangleShape::new(Point2::new(3.8, 1.8), Point2::new(5.0, 3.0)));

        let outlines = ellipse.outlines(0.01);
        assert_eq!(outlines.len(), 1);
        let outline = &outlines[0];
        assert!(outline.len() > 8);
        assert!(sat::overlap(outline, &inside.outlines(0.01)[0]).unwrap());
        assert!(!sat::overlap(outline, &corner.outlines(0.01)[0]).unwrap());

        let bbox = ellipse.bounding_box();
        assert_eq!(bbox.max, Point2::new(4.0, 2.0));
    }

    #[test]
    fn test_curve_shapes_build_single_figure() {
        let line = LineShape::new(Point2::new(0.0, 0.0), Point2::new(3.0, 4.0)).to_geometry();
        assert_eq!(line.figures.len(), 1);
        assert!(!line.figures[0].is_filled);
        assert_eq!(line.figures[0].end_point(), Point2::new(3.0, 4.0));

        let quad = QuadraticBezierShape::new(Point2::origin(), Point2::new(1.0, 2.0), Point2::new(2.0, 0.0));
        let geometry = quad.to_geometry();
        assert!(matches!(geometry.figures[0].segments[0], Segment::QuadraticBezier(_)));
        assert_eq!(geometry.fill_rule, FillRule::NonZero);

        let ellipse = EllipseShape::new(Point2::origin(), Point2::new(4.0, 2.0)).to_geometry();
        let figure = &ellipse.figures[0];
        assert!(figure.is_filled && figure.is_closed);
        assert_eq!(figure.segments.len(), 2);
        assert_eq!(figure.start_point, Point2::new(0.0, 1.0));
    }

    #[test]
    fn test_multi_figure_path_outlines_stay_separate() {
        let square = |x: f64| {
            PathFigure::with_segments(
                Point2::new(x, 0.0),
                true,
                true,
                vec![Segment::poly_line(vec![
                    Point2::new(x + 1.0, 0.0),
                    Point2::new(x + 1.0, 1.0),
                    Point2::new(x, 1.0),
                ])],
            )
        };
        let geometry = PathGeometry::from_figures(FillRule::NonZero, vec![square(0.0), square(4.0)]);
        let path = Shape::Path(PathShape::new(geometry));
        let between = Shape::Rectangle(RectangleShape::new(Point2::new(2.0, 0.25), Point2::new(2.5, 0.75)));

        let outlines = path.outlines(0.1);
        assert_eq!(outlines.len(), 2);
        assert!(outlines.iter().all(|o| o.len() == 4));

        // 盒子位于两个方块之间的空隙
        let gap = &between.outlines(0.1)[0];
        for outline in &outlines {
            assert!(!sat::overlap(outline, gap).unwrap());
        }
        let merged: Vec<Point2> = outlines.concat();
        assert!(sat::overlap(&merged, gap).unwrap());
    }
}
