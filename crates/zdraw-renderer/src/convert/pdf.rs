//! PDF 内容流路径后端
//!
//! PDF 路径构造只有 `m` `l` `c` `h` 四个操作符：二次曲线通过精确升阶表示为
//! `c`，圆弧近似为三次曲线。

use super::{check_policy, unsupported, ArcPolicy, PathConverter};
use crate::error::ConvertError;
use std::fmt;
use zdraw_core::arc::arc_to_cubics;
use zdraw_core::bezier::{elevate_poly_quadratic, elevate_quadratic};
use zdraw_core::math::Point2;
use zdraw_core::path::{FillRule, PathFigure, PathGeometry, Segment};

const BACKEND: &str = "pdf";

/// 路径构造操作
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PdfPathOp {
    MoveTo(Point2),
    LineTo(Point2),
    CurveTo(Point2, Point2, Point2),
    ClosePath,
}

impl PdfPathOp {
    pub fn operator(&self) -> &'static str {
        match self {
            PdfPathOp::MoveTo(_) => "m",
            PdfPathOp::LineTo(_) => "l",
            PdfPathOp::CurveTo(..) => "c",
            PdfPathOp::ClosePath => "h",
        }
    }
}

impl fmt::Display for PdfPathOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfPathOp::MoveTo(p) | PdfPathOp::LineTo(p) => {
                write!(f, "{} {} {}", num(p.x), num(p.y), self.operator())
            }
            PdfPathOp::CurveTo(c1, c2, p) => write!(
                f,
                "{} {} {} {} {} {} c",
                num(c1.x),
                num(c1.y),
                num(c2.x),
                num(c2.y),
                num(p.x),
                num(p.y)
            ),
            PdfPathOp::ClosePath => f.write_str("h"),
        }
    }
}

/// 内容流中的实数，最多保留4位小数
fn num(value: f64) -> String {
    let s = format!("{:.4}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// 填充规则体现在绘制操作符上
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfFillRule {
    NonZero,
    EvenOdd,
}

impl PdfFillRule {
    pub fn fill_operator(&self) -> &'static str {
        match self {
            PdfFillRule::NonZero => "f",
            PdfFillRule::EvenOdd => "f*",
        }
    }

    pub fn fill_stroke_operator(&self) -> &'static str {
        match self {
            PdfFillRule::NonZero => "B",
            PdfFillRule::EvenOdd => "B*",
        }
    }
}

/// `ops` 为完整路径；`fill_ops` 只含 `is_filled` 的图形
#[derive(Debug, Clone, PartialEq)]
pub struct PdfPath {
    pub ops: Vec<PdfPathOp>,
    pub fill_ops: Vec<PdfPathOp>,
    pub fill_rule: PdfFillRule,
}

impl PdfPath {
    pub fn is_fully_filled(&self) -> bool {
        self.fill_ops == self.ops
    }

    /// 生成内容流片段：填充图形加填充操作符。没有填充图形时为空串
    pub fn to_content_stream(&self) -> String {
        if self.fill_ops.is_empty() {
            return String::new();
        }
        let mut lines = op_lines(&self.fill_ops);
        lines.push(self.fill_rule.fill_operator().to_string());
        lines.join("\n")
    }

    /// 填充并描边。全部图形都填充时用一次 `B`/`B*`，否则先填充子集再描边完整路径
    pub fn to_fill_stroke_stream(&self) -> String {
        let mut lines = Vec::new();
        if self.is_fully_filled() {
            lines = op_lines(&self.ops);
            lines.push(self.fill_rule.fill_stroke_operator().to_string());
        } else {
            if !self.fill_ops.is_empty() {
                lines = op_lines(&self.fill_ops);
                lines.push(self.fill_rule.fill_operator().to_string());
            }
            lines.extend(op_lines(&self.ops));
            lines.push("S".to_string());
        }
        lines.join("\n")
    }
}

fn op_lines(ops: &[PdfPathOp]) -> Vec<String> {
    ops.iter().map(|op| op.to_string()).collect()
}

#[derive(Debug, Clone)]
pub struct PdfConverter {
    arc_policy: ArcPolicy,
}

impl Default for PdfConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfConverter {
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

impl PathConverter for PdfConverter {
    type Output = PdfPath;

    fn name(&self) -> &'static str {
        BACKEND
    }

    fn arc_policy(&self) -> ArcPolicy {
        self.arc_policy
    }

    fn convert(&self, geometry: &PathGeometry) -> Result<PdfPath, ConvertError> {
        let mut ops = Vec::new();
        let mut fill_ops = Vec::new();

        for figure in &geometry.figures {
            let start = ops.len();
            self.append_figure(&mut ops, figure)?;
            if figure.is_filled {
                fill_ops.extend_from_slice(&ops[start..]);
            }
        }

        let fill_rule = match geometry.fill_rule {
            FillRule::NonZero => PdfFillRule::NonZero,
            FillRule::EvenOdd => PdfFillRule::EvenOdd,
        };

        tracing::debug!(ops = ops.len(), fill_ops = fill_ops.len(), "converted geometry to pdf path");
        Ok(PdfPath {
            ops,
            fill_ops,
            fill_rule,
        })
    }
}

impl PdfConverter {
    fn append_figure(&self, ops: &mut Vec<PdfPathOp>, figure: &PathFigure) -> Result<(), ConvertError> {
        ops.push(PdfPathOp::MoveTo(figure.start_point));
        let mut current = figure.start_point;

        for segment in &figure.segments {
            segment.validate()?;
            match segment {
                Segment::Line(s) => ops.push(PdfPathOp::LineTo(s.point)),
                Segment::Arc(s) => match self.arc_policy {
                    ArcPolicy::Approximate => {
                        ops.extend(
                            arc_to_cubics(current, s)
                                .into_iter()
                                .map(|[c1, c2, end]| PdfPathOp::CurveTo(c1, c2, end)),
                        );
                    }
                    ArcPolicy::Native | ArcPolicy::Reject => {
                        return Err(unsupported(BACKEND, segment.kind()))
                    }
                },
                Segment::CubicBezier(s) => ops.push(PdfPathOp::CurveTo(s.p1, s.p2, s.p3)),
                Segment::QuadraticBezier(s) => {
                    let controls = elevate_quadratic(current, s.p1, s.p2);
                    ops.push(PdfPathOp::CurveTo(controls.c1, controls.c2, s.p2));
                }
                Segment::PolyLine(s) => {
                    ops.extend(s.points.iter().map(|p| PdfPathOp::LineTo(*p)));
                }
                Segment::PolyCubicBezier(s) => {
                    ops.extend(
                        s.points
                            .chunks_exact(3)
                            .map(|c| PdfPathOp::CurveTo(c[0], c[1], c[2])),
                    );
                }
                Segment::PolyQuadraticBezier(s) => {
                    ops.extend(
                        elevate_poly_quadratic(current, &s.points)
                            .into_iter()
                            .map(|[c1, c2, end]| PdfPathOp::CurveTo(c1, c2, end)),
                    );
                }
            }
            if let Some(end) = segment.end_point() {
                current = end;
            }
        }

        if figure.is_closed {
            ops.push(PdfPathOp::ClosePath);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::tests::{mixed_fill, sample_geometry, unit_triangle};
    use zdraw_core::prelude::*;

    #[test]
    fn test_quadratic_is_elevated_exactly() {
        let mut builder = PathBuilder::new(FillRule::NonZero);
        builder.begin_figure(Point2::new(0.0, 0.0), false, false);
        builder
            .quadratic_bezier_to(Point2::new(1.0, 2.0), Point2::new(2.0, 0.0))
            .unwrap();
        let pdf = PdfConverter::new().convert(&builder.finish()).unwrap();

        assert_eq!(pdf.ops.len(), 2);
        match pdf.ops[1] {
            PdfPathOp::CurveTo(c1, c2, end) => {
                assert!((c1 - Point2::new(2.0 / 3.0, 4.0 / 3.0)).norm() < EPSILON);
                assert!((c2 - Point2::new(4.0 / 3.0, 4.0 / 3.0)).norm() < EPSILON);
                assert_eq!(end, Point2::new(2.0, 0.0));
            }
            other => panic!("expected curve, got {other:?}"),
        }
    }

    #[test]
    fn test_poly_quadratic_chains_start_points() {
        let pdf = PdfConverter::new()
            .convert(&sample_geometry(FillRule::EvenOdd))
            .unwrap();
        // 第二个图形：m, 2×l, 2×c（二次升阶）, 1×c
        let second: Vec<_> = pdf
            .ops
            .iter()
            .skip_while(|op| **op != PdfPathOp::MoveTo(Point2::new(20.0, 0.0)))
            .collect();
        assert_eq!(second.len(), 6);
        match second[3] {
            PdfPathOp::CurveTo(c1, _, end) => {
                // 以上一段终点 (25, 5) 为 P0
                let p0 = Point2::new(25.0, 5.0);
                let expected = p0 + (Point2::new(27.0, 7.0) - p0) * (2.0 / 3.0);
                assert!((c1 - expected).norm() < EPSILON);
                assert_eq!(*end, Point2::new(25.0, 9.0));
            }
            other => panic!("expected curve, got {other:?}"),
        }
    }

    #[test]
    fn test_content_stream() {
        let pdf = PdfConverter::new().convert(&unit_triangle()).unwrap();
        assert_eq!(pdf.to_content_stream(), "0 0 m\n1 0 l\n1 1 l\nh\nf");

        let mut geometry = unit_triangle();
        geometry.fill_rule = FillRule::EvenOdd;
        let pdf = PdfConverter::new().convert(&geometry).unwrap();
        assert!(pdf.to_content_stream().ends_with("h\nf*"));
        assert_eq!(pdf.fill_rule.fill_stroke_operator(), "B*");
        assert_eq!(pdf.to_fill_stroke_stream(), "0 0 m\n1 0 l\n1 1 l\nh\nB*");
    }

    #[test]
    fn test_unfilled_figure_is_stroked_only() {
        let pdf = PdfConverter::new().convert(&mixed_fill()).unwrap();
        assert!(!pdf.is_fully_filled());
        assert_eq!(pdf.fill_ops.len(), 4);
        assert_eq!(pdf.to_content_stream(), "0 0 m\n1 0 l\n1 1 l\nh\nf");
        assert_eq!(
            pdf.to_fill_stroke_stream(),
            "0 0 m\n1 0 l\n1 1 l\nh\nf\n\
             0 0 m\n1 0 l\n1 1 l\nh\n\
             2 0 m\n3 0 l\n3 1 l\n2 1 l\nh\nS"
        );
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(num(1.0), "1");
        assert_eq!(num(0.5), "0.5");
        assert_eq!(num(2.0 / 3.0), "0.6667");
        assert_eq!(num(-0.00001), "0");
        assert_eq!(num(100.0), "100");
    }
}
