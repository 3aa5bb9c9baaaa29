//! 路径构建协议
//!
//! `PathBuilder` 是一个短生命周期的构建器，持有正在构建的 `PathGeometry`
//! 和"当前图形"游标。游标不属于几何本身，构建完成后通过 [`PathBuilder::finish`]
//! 交出不可变的几何值，渲染器永远看不到构建中途的状态。
//!
//! ```rust
//! use zdraw_core::prelude::*;
//!
//! let mut builder = PathBuilder::new(FillRule::NonZero);
//! builder.begin_figure(Point2::new(0.0, 0.0), true, true);
//! builder.line_to(Point2::new(10.0, 0.0)).unwrap();
//! builder.line_to(Point2::new(10.0, 10.0)).unwrap();
//! let geometry = builder.finish();
//! assert_eq!(geometry.figures[0].segments.len(), 2);
//! ```

use crate::error::PathError;
use crate::math::Point2;
use crate::path::{
    check_point_count, ArcSegment, CubicBezierSegment, FillRule, LineSegment, PathFigure,
    PathGeometry, PathSize, PolyCubicBezierSegment, PolyLineSegment, PolyQuadraticBezierSegment,
    QuadraticBezierSegment, Segment, SweepDirection,
};

/// 路径几何构建器
#[derive(Debug, Default)]
pub struct PathBuilder {
    geometry: PathGeometry,
    /// 当前图形在 `geometry.figures` 中的索引
    current: Option<usize>,
}

impl PathBuilder {
    pub fn new(fill_rule: FillRule) -> Self {
        Self {
            geometry: PathGeometry::new(fill_rule),
            current: None,
        }
    }

    /// 重新打开已有几何继续编辑，游标指向最后一个图形
    pub fn edit(geometry: PathGeometry) -> Self {
        let current = geometry.figures.len().checked_sub(1);
        Self { geometry, current }
    }

    /// 开始新图形并设为当前图形
    pub fn begin_figure(&mut self, start: Point2, is_filled: bool, is_closed: bool) {
        self.geometry
            .figures
            .push(PathFigure::new(start, is_filled, is_closed));
        self.current = Some(self.geometry.figures.len() - 1);
    }

    /// 以默认标志（填充、闭合）开始新图形
    pub fn begin_figure_default(&mut self, start: Point2) {
        self.begin_figure(start, true, true);
    }

    fn current_figure(&mut self) -> Result<&mut PathFigure, PathError> {
        let index = self.current.ok_or(PathError::NoOpenFigure)?;
        self.geometry
            .figures
            .get_mut(index)
            .ok_or(PathError::NoOpenFigure)
    }

    fn push(&mut self, segment: Segment) -> Result<(), PathError> {
        let figure = self.current_figure()?;
        tracing::trace!(kind = %segment.kind(), "append segment");
        figure.segments.push(segment);
        Ok(())
    }

    pub fn line_to(&mut self, point: Point2) -> Result<(), PathError> {
        self.line_to_with(point, true, true)
    }

    pub fn line_to_with(
        &mut self,
        point: Point2,
        is_stroked: bool,
        is_smooth_join: bool,
    ) -> Result<(), PathError> {
        self.push(Segment::Line(LineSegment {
            point,
            is_stroked,
            is_smooth_join,
        }))
    }

    /// 追加椭圆弧，`rotation_angle` 单位为度
    pub fn arc_to(
        &mut self,
        point: Point2,
        size: PathSize,
        rotation_angle: f64,
        is_large_arc: bool,
        sweep: SweepDirection,
    ) -> Result<(), PathError> {
        self.arc_to_with(point, size, rotation_angle, is_large_arc, sweep, true, true)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn arc_to_with(
        &mut self,
        point: Point2,
        size: PathSize,
        rotation_angle: f64,
        is_large_arc: bool,
        sweep: SweepDirection,
        is_stroked: bool,
        is_smooth_join: bool,
    ) -> Result<(), PathError> {
        self.push(Segment::Arc(ArcSegment {
            point,
            size,
            rotation_angle,
            is_large_arc,
            sweep,
            is_stroked,
            is_smooth_join,
        }))
    }

    /// 追加三次贝塞尔
    pub fn bezier_to(&mut self, p1: Point2, p2: Point2, p3: Point2) -> Result<(), PathError> {
        self.bezier_to_with(p1, p2, p3, true, true)
    }

    pub fn bezier_to_with(
        &mut self,
        p1: Point2,
        p2: Point2,
        p3: Point2,
        is_stroked: bool,
        is_smooth_join: bool,
    ) -> Result<(), PathError> {
        self.push(Segment::CubicBezier(CubicBezierSegment {
            p1,
            p2,
            p3,
            is_stroked,
            is_smooth_join,
        }))
    }

    pub fn quadratic_bezier_to(&mut self, p1: Point2, p2: Point2) -> Result<(), PathError> {
        self.quadratic_bezier_to_with(p1, p2, true, true)
    }

    pub fn quadratic_bezier_to_with(
        &mut self,
        p1: Point2,
        p2: Point2,
        is_stroked: bool,
        is_smooth_join: bool,
    ) -> Result<(), PathError> {
        self.push(Segment::QuadraticBezier(QuadraticBezierSegment {
            p1,
            p2,
            is_stroked,
            is_smooth_join,
        }))
    }

    pub fn poly_line_to(&mut self, points: Vec<Point2>) -> Result<(), PathError> {
        self.poly_line_to_with(points, true, true)
    }

    pub fn poly_line_to_with(
        &mut self,
        points: Vec<Point2>,
        is_stroked: bool,
        is_smooth_join: bool,
    ) -> Result<(), PathError> {
        self.current_figure()?;
        check_point_count("PolyLine", points.len(), 1)?;
        self.push(Segment::PolyLine(PolyLineSegment {
            points,
            is_stroked,
            is_smooth_join,
        }))
    }

    /// 追加连续三次贝塞尔，点数须为 3 的正整数倍
    pub fn poly_bezier_to(&mut self, points: Vec<Point2>) -> Result<(), PathError> {
        self.poly_bezier_to_with(points, true, true)
    }

    pub fn poly_bezier_to_with(
        &mut self,
        points: Vec<Point2>,
        is_stroked: bool,
        is_smooth_join: bool,
    ) -> Result<(), PathError> {
        self.current_figure()?;
        check_point_count("PolyCubicBezier", points.len(), 3)?;
        self.push(Segment::PolyCubicBezier(PolyCubicBezierSegment {
            points,
            is_stroked,
            is_smooth_join,
        }))
    }

    /// 追加连续二次贝塞尔，点数须为 2 的正整数倍
    pub fn poly_quadratic_bezier_to(&mut self, points: Vec<Point2>) -> Result<(), PathError> {
        self.poly_quadratic_bezier_to_with(points, true, true)
    }

    pub fn poly_quadratic_bezier_to_with(
        &mut self,
        points: Vec<Point2>,
        is_stroked: bool,
        is_smooth_join: bool,
    ) -> Result<(), PathError> {
        self.current_figure()?;
        check_point_count("PolyQuadraticBezier", points.len(), 2)?;
        self.push(Segment::PolyQuadraticBezier(PolyQuadraticBezierSegment {
            points,
            is_stroked,
            is_smooth_join,
        }))
    }

    /// 修改当前图形的闭合状态（交互工具切换闭合时使用）
    pub fn set_closed_state(&mut self, is_closed: bool) -> Result<(), PathError> {
        self.current_figure()?.is_closed = is_closed;
        Ok(())
    }

    pub fn set_fill_rule(&mut self, fill_rule: FillRule) {
        self.geometry.fill_rule = fill_rule;
    }

    /// 当前图形的终点，即下一个线段的起点
    pub fn current_point(&self) -> Option<Point2> {
        self.current
            .and_then(|i| self.geometry.figures.get(i))
            .map(PathFigure::end_point)
    }

    /// 构建中的几何（只读）
    pub fn geometry(&self) -> &PathGeometry {
        &self.geometry
    }

    /// 结束构建，交出几何
    pub fn finish(self) -> PathGeometry {
        self.geometry
    }
}
