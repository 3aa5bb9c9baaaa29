//! SVG 路径数据后端
//!
//! 输出 `d` 属性字符串与 `fill-rule` 属性。SVG 的 `A` 命令与圆弧段的
//! 端点参数化一致，可直接映射。

use super::{check_policy, unsupported, ArcPolicy, PathConverter};
use crate::error::ConvertError;
use std::fmt::Write;
use zdraw_core::arc::arc_to_cubics;
use zdraw_core::math::Point2;
use zdraw_core::path::{FillRule, PathFigure, PathGeometry, Segment, SweepDirection};
use zdraw_core::properties::ShapeStyle;
use zdraw_core::shapes::TextShape;

const BACKEND: &str = "svg";

/// SVG `fill-rule` 取值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SvgFillRule {
    NonZero,
    EvenOdd,
}

impl SvgFillRule {
    pub fn attribute_value(&self) -> &'static str {
        match self {
            SvgFillRule::NonZero => "nonzero",
            SvgFillRule::EvenOdd => "evenodd",
        }
    }
}

/// SVG 原生路径
///
/// `data` 含全部图形，用于描边；`fill_data` 只含 `is_filled` 的图形。
#[derive(Debug, Clone, PartialEq)]
pub struct SvgPath {
    pub data: String,
    pub fill_data: String,
    pub fill_rule: SvgFillRule,
}

fn push_fill(element: &mut String, style: &ShapeStyle) {
    if style.fill.is_transparent() {
        element.push_str(r#" fill="none""#);
    } else {
        let _ = write!(element, r#" fill="{}""#, style.fill.to_hex());
        if style.fill.a < 255 {
            let _ = write!(element, r#" fill-opacity="{:.3}""#, style.fill.opacity());
        }
    }
}

fn push_stroke(element: &mut String, style: &ShapeStyle) {
    if style.stroke.is_transparent() {
        element.push_str(r#" stroke="none""#);
    } else {
        let _ = write!(
            element,
            r#" stroke="{}" stroke-width="{}""#,
            style.stroke.to_hex(),
            style.stroke_width
        );
        if style.stroke.a < 255 {
            let _ = write!(element, r#" stroke-opacity="{:.3}""#, style.stroke.opacity());
        }
        if style.is_dashed() {
            let dashes: Vec<String> = style.dash_pattern.iter().map(|d| d.to_string()).collect();
            let _ = write!(element, r#" stroke-dasharray="{}""#, dashes.join(","));
        }
    }
}

impl SvgPath {
    /// 所有图形都参与填充
    pub fn is_fully_filled(&self) -> bool {
        self.fill_data == self.data
    }

    /// 生成 `<path>` 元素
    ///
    /// 有不填充的图形时输出 `<g>`：先是只含填充图形的填充路径，再是完整的描边路径。
    pub fn to_element(&self, style: &ShapeStyle) -> String {
        let fill_rule = self.fill_rule.attribute_value();
        if self.is_fully_filled() {
            let mut element = format!(r#"<path d="{}" fill-rule="{}""#, self.data, fill_rule);
            push_fill(&mut element, style);
            push_stroke(&mut element, style);
            element.push_str("/>");
            return element;
        }

        let mut element = String::from("<g>");
        if !self.fill_data.is_empty() && !style.fill.is_transparent() {
            let _ = write!(element, r#"<path d="{}" fill-rule="{}""#, self.fill_data, fill_rule);
            push_fill(&mut element, style);
            element.push_str(r#" stroke="none"/>"#);
        }
        let _ = write!(element, r#"<path d="{}" fill="none""#, self.data);
        push_stroke(&mut element, style);
        element.push_str("/></g>");
        element
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// 生成 `<text>` 元素，`position` 为文本左上角
pub fn text_element(shape: &TextShape, style: &ShapeStyle) -> String {
    let color = style.text_color();
    let mut element = String::from("<text");
    for (name, value) in [
        ("x", shape.position.x),
        ("y", shape.position.y),
        ("font-size", shape.height),
    ] {
        let _ = write!(element, r#" {}=""#, name);
        push_number(&mut element, value);
        element.push('"');
    }
    let _ = write!(
        element,
        r#" dominant-baseline="text-before-edge" fill="{}""#,
        color.to_hex()
    );
    if color.a < 255 {
        let _ = write!(element, r#" fill-opacity="{:.3}""#, color.opacity());
    }
    let _ = write!(element, ">{}</text>", escape_xml(&shape.content));
    element
}

/// SVG 路径转换器
#[derive(Debug, Clone)]
pub struct SvgConverter {
    arc_policy: ArcPolicy,
}

impl Default for SvgConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl SvgConverter {
    pub fn new() -> Self {
        Self {
            arc_policy: ArcPolicy::Native,
        }
    }

    pub fn with_arc_policy(arc_policy: ArcPolicy) -> Result<Self, ConvertError> {
        Ok(Self {
            arc_policy: check_policy(BACKEND, arc_policy, true)?,
        })
    }
}

/// 写入坐标，消除 `-0`
fn push_number(out: &mut String, value: f64) {
    let value = if value == 0.0 { 0.0 } else { value };
    let _ = write!(out, "{}", value);
}

fn push_command(out: &mut String, command: char, points: &[Point2]) {
    if !out.is_empty() {
        out.push(' ');
    }
    out.push(command);
    for p in points {
        out.push(' ');
        push_number(out, p.x);
        out.push(' ');
        push_number(out, p.y);
    }
}

impl PathConverter for SvgConverter {
    type Output = SvgPath;

    fn name(&self) -> &'static str {
        BACKEND
    }

    fn arc_policy(&self) -> ArcPolicy {
        self.arc_policy
    }

    fn convert(&self, geometry: &PathGeometry) -> Result<SvgPath, ConvertError> {
        let mut data = String::new();
        let mut fill_data = String::new();

        for figure in &geometry.figures {
            let figure_data = self.figure_data(figure)?;
            join_figure(&mut data, &figure_data);
            if figure.is_filled {
                join_figure(&mut fill_data, &figure_data);
            }
        }

        let fill_rule = match geometry.fill_rule {
            FillRule::NonZero => SvgFillRule::NonZero,
            FillRule::EvenOdd => SvgFillRule::EvenOdd,
        };

        tracing::debug!(figures = geometry.figures.len(), "converted geometry to svg path");
        Ok(SvgPath {
            data,
            fill_data,
            fill_rule,
        })
    }
}

fn join_figure(out: &mut String, figure_data: &str) {
    if !out.is_empty() {
        out.push(' ');
    }
    out.push_str(figure_data);
}

impl SvgConverter {
    /// 单个图形的路径数据，以 `M` 开头
    fn figure_data(&self, figure: &PathFigure) -> Result<String, ConvertError> {
        let mut data = String::new();
        push_command(&mut data, 'M', &[figure.start_point]);
        let mut current = figure.start_point;

        for segment in &figure.segments {
            segment.validate()?;
            match segment {
                Segment::Line(s) => {
                    push_command(&mut data, 'L', &[s.point]);
                }
                Segment::Arc(s) => match self.arc_policy {
                    ArcPolicy::Native => {
                        data.push_str(" A ");
                        push_number(&mut data, s.size.width);
                        data.push(' ');
                        push_number(&mut data, s.size.height);
                        data.push(' ');
                        push_number(&mut data, s.rotation_angle);
                        let large = if s.is_large_arc { '1' } else { '0' };
                        let sweep = match s.sweep {
                            SweepDirection::Clockwise => '1',
                            SweepDirection::CounterClockwise => '0',
                        };
                        let _ = write!(data, " {} {} ", large, sweep);
                        push_number(&mut data, s.point.x);
                        data.push(' ');
                        push_number(&mut data, s.point.y);
                    }
                    ArcPolicy::Approximate => {
                        for [c1, c2, end] in arc_to_cubics(current, s) {
                            push_command(&mut data, 'C', &[c1, c2, end]);
                        }
                    }
                    ArcPolicy::Reject => return Err(unsupported(BACKEND, segment.kind())),
                },
                Segment::CubicBezier(s) => {
                    push_command(&mut data, 'C', &[s.p1, s.p2, s.p3]);
                }
                Segment::QuadraticBezier(s) => {
                    push_command(&mut data, 'Q', &[s.p1, s.p2]);
                }
                Segment::PolyLine(s) => {
                    for p in &s.points {
                        push_command(&mut data, 'L', &[*p]);
                    }
                }
                Segment::PolyCubicBezier(s) => {
                    for c in s.points.chunks_exact(3) {
                        push_command(&mut data, 'C', c);
                    }
                }
                Segment::PolyQuadraticBezier(s) => {
                    for c in s.points.chunks_exact(2) {
                        push_command(&mut data, 'Q', c);
                    }
                }
            }
            if let Some(end) = segment.end_point() {
                current = end;
            }
        }

        if figure.is_closed {
            data.push_str(" Z");
        }
        Ok(data)
    }
}
