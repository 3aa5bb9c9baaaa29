//! 路径几何中间表示（IR）
//!
//! 与分辨率和渲染后端无关的路径模型：
//! `PathGeometry` → `PathFigure` → `Segment`。
//!
//! 几何一旦挂到图形上即视为不可变值。编辑控制点时替换整个线段
//! （见 [`PathGeometry::replace_segment`]），而不是原地修改共享数据。

use crate::arc;
use crate::bezier;
use crate::error::PathError;
use crate::math::{BoundingBox2, Point2};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 椭圆弧半径
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PathSize {
    pub width: f64,
    pub height: f64,
}

impl PathSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// 填充规则，作用于整个 `PathGeometry`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FillRule {
    NonZero,
    #[default]
    EvenOdd,
}

/// 圆弧扫掠方向
///
/// 编辑器坐标系 y 轴向下，`Clockwise` 即角度递增方向。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SweepDirection {
    #[default]
    Clockwise,
    CounterClockwise,
}

/// 直线段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub point: Point2,
    pub is_stroked: bool,
    pub is_smooth_join: bool,
}

/// 椭圆弧段（端点参数化，与 SVG 的 `A` 命令一致）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcSegment {
    pub point: Point2,
    pub size: PathSize,
    /// x 轴旋转角（度）
    pub rotation_angle: f64,
    pub is_large_arc: bool,
    pub sweep: SweepDirection,
    pub is_stroked: bool,
    pub is_smooth_join: bool,
}

/// 三次贝塞尔段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubicBezierSegment {
    pub p1: Point2,
    pub p2: Point2,
    pub p3: Point2,
    pub is_stroked: bool,
    pub is_smooth_join: bool,
}

/// 二次贝塞尔段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadraticBezierSegment {
    pub p1: Point2,
    pub p2: Point2,
    pub is_stroked: bool,
    pub is_smooth_join: bool,
}

/// 连续折线
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolyLineSegment {
    pub points: Vec<Point2>,
    pub is_stroked: bool,
    pub is_smooth_join: bool,
}

/// 连续三次贝塞尔，点数为 3 的正整数倍
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolyCubicBezierSegment {
    pub points: Vec<Point2>,
    pub is_stroked: bool,
    pub is_smooth_join: bool,
}

/// 连续二次贝塞尔，点数为 2 的正整数倍
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolyQuadraticBezierSegment {
    pub points: Vec<Point2>,
    pub is_stroked: bool,
    pub is_smooth_join: bool,
}

/// 线段类型（封闭枚举，转换器必须穷尽匹配）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Segment {
    Line(LineSegment),
    Arc(ArcSegment),
    CubicBezier(CubicBezierSegment),
    QuadraticBezier(QuadraticBezierSegment),
    PolyLine(PolyLineSegment),
    PolyCubicBezier(PolyCubicBezierSegment),
    PolyQuadraticBezier(PolyQuadraticBezierSegment),
}

/// 线段类型名，用于错误信息和日志
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Line,
    Arc,
    CubicBezier,
    QuadraticBezier,
    PolyLine,
    PolyCubicBezier,
    PolyQuadraticBezier,
}

impl SegmentKind {
    pub fn name(&self) -> &'static str {
        match self {
            SegmentKind::Line => "Line",
            SegmentKind::Arc => "Arc",
            SegmentKind::CubicBezier => "CubicBezier",
            SegmentKind::QuadraticBezier => "QuadraticBezier",
            SegmentKind::PolyLine => "PolyLine",
            SegmentKind::PolyCubicBezier => "PolyCubicBezier",
            SegmentKind::PolyQuadraticBezier => "PolyQuadraticBezier",
        }
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Segment {
    pub fn kind(&self) -> SegmentKind {
        match self {
            Segment::Line(_) => SegmentKind::Line,
            Segment::Arc(_) => SegmentKind::Arc,
            Segment::CubicBezier(_) => SegmentKind::CubicBezier,
            Segment::QuadraticBezier(_) => SegmentKind::QuadraticBezier,
            Segment::PolyLine(_) => SegmentKind::PolyLine,
            Segment::PolyCubicBezier(_) => SegmentKind::PolyCubicBezier,
            Segment::PolyQuadraticBezier(_) => SegmentKind::PolyQuadraticBezier,
        }
    }

    pub fn is_stroked(&self) -> bool {
        match self {
            Segment::Line(s) => s.is_stroked,
            Segment::Arc(s) => s.is_stroked,
            Segment::CubicBezier(s) => s.is_stroked,
            Segment::QuadraticBezier(s) => s.is_stroked,
            Segment::PolyLine(s) => s.is_stroked,
            Segment::PolyCubicBezier(s) => s.is_stroked,
            Segment::PolyQuadraticBezier(s) => s.is_stroked,
        }
    }

    pub fn is_smooth_join(&self) -> bool {
        match self {
            Segment::Line(s) => s.is_smooth_join,
            Segment::Arc(s) => s.is_smooth_join,
            Segment::CubicBezier(s) => s.is_smooth_join,
            Segment::QuadraticBezier(s) => s.is_smooth_join,
            Segment::PolyLine(s) => s.is_smooth_join,
            Segment::PolyCubicBezier(s) => s.is_smooth_join,
            Segment::PolyQuadraticBezier(s) => s.is_smooth_join,
        }
    }

    /// 线段终点；点列为空的多段返回 None
    pub fn end_point(&self) -> Option<Point2> {
        match self {
            Segment::Line(s) => Some(s.point),
            Segment::Arc(s) => Some(s.point),
            Segment::CubicBezier(s) => Some(s.p3),
            Segment::QuadraticBezier(s) => Some(s.p2),
            Segment::PolyLine(s) => s.points.last().copied(),
            Segment::PolyCubicBezier(s) => s.points.last().copied(),
            Segment::PolyQuadraticBezier(s) => s.points.last().copied(),
        }
    }

    /// 校验多段点数
    pub fn validate(&self) -> Result<(), PathError> {
        match self {
            Segment::PolyLine(s) => check_point_count("PolyLine", s.points.len(), 1),
            Segment::PolyCubicBezier(s) => check_point_count("PolyCubicBezier", s.points.len(), 3),
            Segment::PolyQuadraticBezier(s) => {
                check_point_count("PolyQuadraticBezier", s.points.len(), 2)
            }
            Segment::Line(_) | Segment::Arc(_) | Segment::CubicBezier(_) | Segment::QuadraticBezier(_) => {
                Ok(())
            }
        }
    }
}

impl Segment {
    /// 描边、平滑连接的直线段
    pub fn line(point: Point2) -> Self {
        Segment::Line(LineSegment {
            point,
            is_stroked: true,
            is_smooth_join: true,
        })
    }

    pub fn arc(point: Point2, size: PathSize, rotation_angle: f64, is_large_arc: bool, sweep: SweepDirection) -> Self {
        Segment::Arc(ArcSegment {
            point,
            size,
            rotation_angle,
            is_large_arc,
            sweep,
            is_stroked: true,
            is_smooth_join: true,
        })
    }

    pub fn cubic(p1: Point2, p2: Point2, p3: Point2) -> Self {
        Segment::CubicBezier(CubicBezierSegment {
            p1,
            p2,
            p3,
            is_stroked: true,
            is_smooth_join: true,
        })
    }

    pub fn quadratic(p1: Point2, p2: Point2) -> Self {
        Segment::QuadraticBezier(QuadraticBezierSegment {
            p1,
            p2,
            is_stroked: true,
            is_smooth_join: true,
        })
    }

    pub fn poly_line(points: Vec<Point2>) -> Self {
        Segment::PolyLine(PolyLineSegment {
            points,
            is_stroked: true,
            is_smooth_join: true,
        })
    }

    fn hash_into<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        self.is_stroked().hash(state);
        self.is_smooth_join().hash(state);
        match self {
            Segment::Line(s) => hash_point(&s.point, state),
            Segment::Arc(s) => {
                hash_point(&s.point, state);
                s.size.width.to_bits().hash(state);
                s.size.height.to_bits().hash(state);
                s.rotation_angle.to_bits().hash(state);
                s.is_large_arc.hash(state);
                s.sweep.hash(state);
            }
            Segment::CubicBezier(s) => {
                for p in [&s.p1, &s.p2, &s.p3] {
                    hash_point(p, state);
                }
            }
            Segment::QuadraticBezier(s) => {
                hash_point(&s.p1, state);
                hash_point(&s.p2, state);
            }
            Segment::PolyLine(PolyLineSegment { points, .. })
            | Segment::PolyCubicBezier(PolyCubicBezierSegment { points, .. })
            | Segment::PolyQuadraticBezier(PolyQuadraticBezierSegment { points, .. }) => {
                points.len().hash(state);
                for p in points {
                    hash_point(p, state);
                }
            }
        }
    }
}

fn hash_point<H: Hasher>(point: &Point2, state: &mut H) {
    point.x.to_bits().hash(state);
    point.y.to_bits().hash(state);
}

pub(crate) fn check_point_count(kind: &'static str, count: usize, multiple: usize) -> Result<(), PathError> {
    if count == 0 || count % multiple != 0 {
        return Err(PathError::InvalidPointCount {
            kind,
            count,
            multiple,
        });
    }
    Ok(())
}

/// 展开后的基本绘制指令（多段已拆分，起点已知）
enum Primitive<'a> {
    Line(Point2),
    Quadratic(Point2, Point2),
    Cubic(Point2, Point2, Point2),
    Arc(&'a ArcSegment),
}

/// 路径图形（子路径）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathFigure {
    pub start_point: Point2,
    pub segments: Vec<Segment>,
    pub is_filled: bool,
    pub is_closed: bool,
}

impl PathFigure {
    pub fn new(start_point: Point2, is_filled: bool, is_closed: bool) -> Self {
        Self {
            start_point,
            segments: Vec::new(),
            is_filled,
            is_closed,
        }
    }

    pub fn with_segments(start_point: Point2, is_filled: bool, is_closed: bool, segments: Vec<Segment>) -> Self {
        Self {
            start_point,
            segments,
            is_filled,
            is_closed,
        }
    }

    /// 最后一个线段的终点，无线段时为起点
    pub fn end_point(&self) -> Point2 {
        self.segments
            .iter()
            .rev()
            .find_map(Segment::end_point)
            .unwrap_or(self.start_point)
    }

    /// 按顺序遍历展开后的指令，回调参数为 (当前点, 指令)
    fn for_each_primitive(&self, mut f: impl FnMut(Point2, Primitive<'_>)) {
        let mut current = self.start_point;
        for segment in &self.segments {
            match segment {
                Segment::Line(s) => {
                    f(current, Primitive::Line(s.point));
                    current = s.point;
                }
                Segment::Arc(s) => {
                    f(current, Primitive::Arc(s));
                    current = s.point;
                }
                Segment::CubicBezier(s) => {
                    f(current, Primitive::Cubic(s.p1, s.p2, s.p3));
                    current = s.p3;
                }
                Segment::QuadraticBezier(s) => {
                    f(current, Primitive::Quadratic(s.p1, s.p2));
                    current = s.p2;
                }
                Segment::PolyLine(s) => {
                    for p in &s.points {
                        f(current, Primitive::Line(*p));
                        current = *p;
                    }
                }
                Segment::PolyCubicBezier(s) => {
                    for c in s.points.chunks_exact(3) {
                        f(current, Primitive::Cubic(c[0], c[1], c[2]));
                        current = c[2];
                    }
                }
                Segment::PolyQuadraticBezier(s) => {
                    for c in s.points.chunks_exact(2) {
                        f(current, Primitive::Quadratic(c[0], c[1]));
                        current = c[1];
                    }
                }
            }
        }
    }

    /// 包围盒（曲线取控制点凸包，结果偏保守）
    pub fn bounding_box(&self) -> BoundingBox2 {
        let mut bbox = BoundingBox2::from_points([self.start_point]);
        self.for_each_primitive(|from, primitive| match primitive {
            Primitive::Line(p) => bbox.expand_to_include(&p),
            Primitive::Quadratic(c, p) => {
                bbox.expand_to_include(&c);
                bbox.expand_to_include(&p);
            }
            Primitive::Cubic(c1, c2, p) => {
                bbox.expand_to_include(&c1);
                bbox.expand_to_include(&c2);
                bbox.expand_to_include(&p);
            }
            Primitive::Arc(a) => {
                bbox.expand_to_include(&a.point);
                for [c1, c2, p] in arc::arc_to_cubics(from, a) {
                    bbox.expand_to_include(&c1);
                    bbox.expand_to_include(&c2);
                    bbox.expand_to_include(&p);
                }
            }
        });
        bbox
    }

    /// 展平为顶点列表（含起点），用于 SAT 与点击测试
    ///
    /// 闭合图形不重复输出起点。
    pub fn to_polygon(&self, tolerance: f64) -> Vec<Point2> {
        let mut out = vec![self.start_point];
        self.for_each_primitive(|from, primitive| match primitive {
            Primitive::Line(p) => out.push(p),
            Primitive::Quadratic(c, p) => bezier::flatten_quadratic(from, c, p, tolerance, &mut out),
            Primitive::Cubic(c1, c2, p) => bezier::flatten_cubic(from, c1, c2, p, tolerance, &mut out),
            Primitive::Arc(a) => {
                let mut current = from;
                for [c1, c2, p] in arc::arc_to_cubics(from, a) {
                    bezier::flatten_cubic(current, c1, c2, p, tolerance, &mut out);
                    current = p;
                }
            }
        });

        if self.is_closed && out.len() > 1 {
            let first = out[0];
            if let Some(last) = out.last() {
                if (last - first).norm() < crate::math::EPSILON {
                    out.pop();
                }
            }
        }
        out
    }
}

/// 路径几何
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathGeometry {
    pub figures: Vec<PathFigure>,
    pub fill_rule: FillRule,
}

impl PathGeometry {
    pub fn new(fill_rule: FillRule) -> Self {
        Self {
            figures: Vec::new(),
            fill_rule,
        }
    }

    pub fn from_figures(fill_rule: FillRule, figures: Vec<PathFigure>) -> Self {
        Self { figures, fill_rule }
    }

    pub fn is_empty(&self) -> bool {
        self.figures.is_empty()
    }

    /// 内容指纹，浮点按位参与计算
    ///
    /// 相等的几何指纹相同；编辑后指纹改变，渲染缓存据此判断是否失效。
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.fill_rule.hash(&mut hasher);
        self.figures.len().hash(&mut hasher);
        for figure in &self.figures {
            hash_point(&figure.start_point, &mut hasher);
            figure.is_filled.hash(&mut hasher);
            figure.is_closed.hash(&mut hasher);
            figure.segments.len().hash(&mut hasher);
            for segment in &figure.segments {
                segment.hash_into(&mut hasher);
            }
        }
        hasher.finish()
    }

    pub fn figure_count(&self) -> usize {
        self.figures.len()
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        self.figures
            .iter()
            .fold(BoundingBox2::empty(), |acc, f| acc.union(&f.bounding_box()))
    }

    /// 替换指定线段，返回被替换的旧线段
    pub fn replace_segment(
        &mut self,
        figure: usize,
        segment: usize,
        replacement: Segment,
    ) -> Result<Segment, PathError> {
        replacement.validate()?;
        let target = self
            .figures
            .get_mut(figure)
            .ok_or(PathError::FigureOutOfRange(figure))?
            .segments
            .get_mut(segment)
            .ok_or(PathError::SegmentOutOfRange { figure, segment })?;
        Ok(std::mem::replace(target, replacement))
    }
}
