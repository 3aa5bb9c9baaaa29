//! lyon 路径后端（用于GPU三角化）
//!
//! lyon 的路径构建器没有圆弧指令，圆弧只能近似或拒绝。
//! 坐标为 f32。

use super::{check_policy, unsupported, ArcPolicy, PathConverter};
use crate::error::ConvertError;
use lyon_path::math::{point, Point};
use lyon_path::path::Builder;
use lyon_path::{FillRule as LyonFillRule, Path};
use zdraw_core::arc::arc_to_cubics;
use zdraw_core::math::Point2;
use zdraw_core::path::{FillRule, PathFigure, PathGeometry, Segment};

const BACKEND: &str = "lyon";

/// lyon 原生路径，填充规则在三角化时使用
///
/// `path` 含全部图形，供描边三角化；`fill_path` 只含 `is_filled` 的图形。
#[derive(Debug, Clone)]
pub struct LyonPath {
    pub path: Path,
    pub fill_path: Path,
    pub fill_rule: LyonFillRule,
}

#[derive(Debug, Clone)]
pub struct LyonConverter {
    arc_policy: ArcPolicy,
}

impl Default for LyonConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl LyonConverter {
    pub fn new() -> Self {
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

fn pt(p: Point2) -> Point {
    point(p.x as f32, p.y as f32)
}

impl PathConverter for LyonConverter {
    type Output = LyonPath;

    fn name(&self) -> &'static str {
        BACKEND
    }

    fn arc_policy(&self) -> ArcPolicy {
        self.arc_policy
    }

    fn convert(&self, geometry: &PathGeometry) -> Result<LyonPath, ConvertError> {
        let mut builder = Path::builder();
        let mut fill_builder = Path::builder();

        for figure in &geometry.figures {
            self.append_figure(&mut builder, figure)?;
            if figure.is_filled {
                self.append_figure(&mut fill_builder, figure)?;
            }
        }

        let fill_rule = match geometry.fill_rule {
            FillRule::NonZero => LyonFillRule::NonZero,
            FillRule::EvenOdd => LyonFillRule::EvenOdd,
        };

        tracing::debug!(figures = geometry.figures.len(), "converted geometry to lyon path");
        Ok(LyonPath {
            path: builder.build(),
            fill_path: fill_builder.build(),
            fill_rule,
        })
    }
}

impl LyonConverter {
    fn append_figure(&self, builder: &mut Builder, figure: &PathFigure) -> Result<(), ConvertError> {
        builder.begin(pt(figure.start_point));
        let mut current = figure.start_point;

        for segment in &figure.segments {
            segment.validate()?;
            match segment {
                Segment::Line(s) => {
                    builder.line_to(pt(s.point));
                }
                Segment::Arc(s) => match self.arc_policy {
                    ArcPolicy::Approximate => {
                        for [c1, c2, end] in arc_to_cubics(current, s) {
                            builder.cubic_bezier_to(pt(c1), pt(c2), pt(end));
                        }
                    }
                    ArcPolicy::Native | ArcPolicy::Reject => {
                        return Err(unsupported(BACKEND, segment.kind()))
                    }
                },
                Segment::CubicBezier(s) => {
                    builder.cubic_bezier_to(pt(s.p1), pt(s.p2), pt(s.p3));
                }
                Segment::QuadraticBezier(s) => {
                    builder.quadratic_bezier_to(pt(s.p1), pt(s.p2));
                }
                Segment::PolyLine(s) => {
                    for p in &s.points {
                        builder.line_to(pt(*p));
                    }
                }
                Segment::PolyCubicBezier(s) => {
                    for c in s.points.chunks_exact(3) {
                        builder.cubic_bezier_to(pt(c[0]), pt(c[1]), pt(c[2]));
                    }
                }
                Segment::PolyQuadraticBezier(s) => {
                    for c in s.points.chunks_exact(2) {
                        builder.quadratic_bezier_to(pt(c[0]), pt(c[1]));
                    }
                }
            }
            if let Some(end) = segment.end_point() {
                current = end;
            }
        }

        builder.end(figure.is_closed);
        Ok(())
    }
}
