//! tiny-skia 光栅化后端
//!
//! tiny-skia 没有圆弧指令。默认拒绝圆弧，由调用方显式选择近似。

use super::{check_policy, unsupported, ArcPolicy, PathConverter};
use crate::error::ConvertError;
use tiny_skia::{FillRule as SkiaFillRule, Path, PathBuilder};
use zdraw_core::arc::arc_to_cubics;
use zdraw_core::path::{FillRule, PathFigure, PathGeometry, Segment};

const BACKEND: &str = "tiny-skia";

/// `path` 用于描边；`fill_path` 只含 `is_filled` 的图形，没有时为 `None`
#[derive(Debug, Clone)]
pub struct SkiaPath {
    pub path: Path,
    pub fill_path: Option<Path>,
    pub fill_rule: SkiaFillRule,
}

#[derive(Debug, Clone)]
pub struct SkiaConverter {
    arc_policy: ArcPolicy,
}

impl Default for SkiaConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl SkiaConverter {
    pub fn new() -> Self {
        Self {
            arc_policy: ArcPolicy::Reject,
        }
    }

    /// 圆弧近似为三次曲线，渲染器绘制椭圆和圆弧时使用
    pub fn approximating() -> Self {
        Self {
            arc_policy: ArcPolicy::Approximate,
        }
    }

    pub fn with_arc_policy(arc_policy: ArcPolicy) -> Result<Self, ConvertError> {
        Ok(Self {
            arc_policy: check_policy(BACKEND, arc_policy, false)?,
        })
    }
}

impl PathConverter for SkiaConverter {
    type Output = SkiaPath;

    fn name(&self) -> &'static str {
        BACKEND
    }

    fn arc_policy(&self) -> ArcPolicy {
        self.arc_policy
    }

    fn convert(&self, geometry: &PathGeometry) -> Result<SkiaPath, ConvertError> {
        let mut pb = PathBuilder::new();
        let mut fill_pb = PathBuilder::new();

        for figure in &geometry.figures {
            self.append_figure(&mut pb, figure)?;
            if figure.is_filled {
                self.append_figure(&mut fill_pb, figure)?;
            }
        }

        // 空几何或退化到单点时 tiny-skia 返回 None
        let path = pb.finish().ok_or(ConvertError::EmptyPath(BACKEND))?;
        let fill_path = fill_pb.finish();
        let fill_rule = match geometry.fill_rule {
            FillRule::NonZero => SkiaFillRule::Winding,
            FillRule::EvenOdd => SkiaFillRule::EvenOdd,
        };

        tracing::debug!(figures = geometry.figures.len(), "converted geometry to tiny-skia path");
        Ok(SkiaPath {
            path,
            fill_path,
            fill_rule,
        })
    }
}

impl SkiaConverter {
    fn append_figure(&self, pb: &mut PathBuilder, figure: &PathFigure) -> Result<(), ConvertError> {
        let start = figure.start_point;
        pb.move_to(start.x as f32, start.y as f32);
        let mut current = start;

        for segment in &figure.segments {
            segment.validate()?;
            match segment {
                Segment::Line(s) => pb.line_to(s.point.x as f32, s.point.y as f32),
                Segment::Arc(s) => match self.arc_policy {
                    ArcPolicy::Approximate => {
                        for [c1, c2, end] in arc_to_cubics(current, s) {
                            pb.cubic_to(
                                c1.x as f32,
                                c1.y as f32,
                                c2.x as f32,
                                c2.y as f32,
                                end.x as f32,
                                end.y as f32,
                            );
                        }
                    }
                    ArcPolicy::Native | ArcPolicy::Reject => {
                        return Err(unsupported(BACKEND, segment.kind()))
                    }
                },
                Segment::CubicBezier(s) => pb.cubic_to(
                    s.p1.x as f32,
                    s.p1.y as f32,
                    s.p2.x as f32,
                    s.p2.y as f32,
                    s.p3.x as f32,
                    s.p3.y as f32,
                ),
                Segment::QuadraticBezier(s) => {
                    pb.quad_to(s.p1.x as f32, s.p1.y as f32, s.p2.x as f32, s.p2.y as f32)
                }
                Segment::PolyLine(s) => {
                    for p in &s.points {
                        pb.line_to(p.x as f32, p.y as f32);
                    }
                }
                Segment::PolyCubicBezier(s) => {
                    for c in s.points.chunks_exact(3) {
                        pb.cubic_to(
                            c[0].x as f32,
                            c[0].y as f32,
                            c[1].x as f32,
                            c[1].y as f32,
                            c[2].x as f32,
                            c[2].y as f32,
                        );
                    }
                }
                Segment::PolyQuadraticBezier(s) => {
                    for c in s.points.chunks_exact(2) {
                        pb.quad_to(c[0].x as f32, c[0].y as f32, c[1].x as f32, c[1].y as f32);
                    }
                }
            }
            if let Some(end) = segment.end_point() {
                current = end;
            }
        }

        if figure.is_closed {
            pb.close();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::tests::{mixed_fill, sample_geometry, unit_triangle, with_arc};
    use tiny_skia::PathSegment;

    #[test]
    fn test_closed_triangle_segments() {
        let skia = SkiaConverter::new().convert(&unit_triangle()).unwrap();
        let segments: Vec<_> = skia.path.segments().collect();
        assert_eq!(segments.len(), 4);
        assert!(matches!(segments[0], PathSegment::MoveTo(_)));
        assert!(matches!(segments[3], PathSegment::Close));
        assert_eq!(skia.fill_rule, SkiaFillRule::Winding);
    }

    #[test]
    fn test_open_figure_is_not_closed() {
        let skia = SkiaConverter::new()
            .convert(&sample_geometry(FillRule::EvenOdd))
            .unwrap();
        let closes = skia
            .path
            .segments()
            .filter(|s| matches!(s, PathSegment::Close))
            .count();
        assert_eq!(closes, 1);
        assert!(!matches!(skia.path.segments().last(), Some(PathSegment::Close)));
    }

    #[test]
    fn test_empty_geometry_is_an_error() {
        let result = SkiaConverter::new().convert(&PathGeometry::default());
        assert_eq!(result.unwrap_err(), ConvertError::EmptyPath("tiny-skia"));
    }

    #[test]
    fn test_explicit_approximation() {
        let converter = SkiaConverter::with_arc_policy(ArcPolicy::Approximate).unwrap();
        assert_eq!(converter.arc_policy(), SkiaConverter::approximating().arc_policy());
        let skia = converter.convert(&with_arc()).unwrap();
        let cubics = skia
            .path
            .segments()
            .filter(|s| matches!(s, PathSegment::CubicTo(..)))
            .count();
        assert_eq!(cubics, 2);
    }

    #[test]
    fn test_fill_path_keeps_filled_figures_only() {
        let skia = SkiaConverter::new().convert(&mixed_fill()).unwrap();
        let moves = |path: &Path| {
            path.segments()
                .filter(|s| matches!(s, PathSegment::MoveTo(_)))
                .count()
        };
        assert_eq!(moves(&skia.path), 2);
        let fill = skia.fill_path.expect("triangle is filled");
        assert_eq!(moves(&fill), 1);
        // 未填充的方形在 x = 2..3，填充路径不应覆盖它
        assert!(fill.bounds().right() <= 1.0);
    }

    #[test]
    fn test_no_filled_figure_gives_no_fill_path() {
        let mut geometry = unit_triangle();
        geometry.figures[0].is_filled = false;
        let skia = SkiaConverter::new().convert(&geometry).unwrap();
        assert!(skia.fill_path.is_none());
    }
}
