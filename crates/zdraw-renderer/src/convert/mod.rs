//! 路径IR到各后端原生路径的转换
//!
//! 每个转换器都是无状态的纯函数：打开原生路径构建器，逐图形开始子路径，
//! 对线段类型穷尽匹配并调用对应的原生追加操作，闭合子路径，最后一次性设置
//! 填充规则。遇到后端无法表示的线段直接报错，不输出残缺的几何。
//!
//! 各后端都没有子路径级的填充开关，因此输出同时带有完整路径（描边用）和
//! 只含 `is_filled` 图形的填充路径。
//!
//! | 后端 | 二次曲线 | 圆弧默认策略 |
//! |---|---|---|
//! | [`SvgConverter`] | 原生 `Q` | `Native`（`A` 命令） |
//! | [`LyonConverter`] | 原生 | `Approximate` |
//! | [`SkiaConverter`] | 原生 | `Reject` |
//! | [`PdfConverter`] | 升阶为三次 | `Approximate` |

mod lyon;
mod pdf;
mod skia;
mod svg;

pub use self::lyon::{LyonConverter, LyonPath};
pub use self::pdf::{PdfConverter, PdfFillRule, PdfPath, PdfPathOp};
pub use self::skia::{SkiaConverter, SkiaPath};
pub use self::svg::{text_element, SvgConverter, SvgFillRule, SvgPath};

use crate::error::ConvertError;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use zdraw_core::path::{PathGeometry, SegmentKind};

/// 圆弧处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArcPolicy {
    /// 直接映射到后端原生的圆弧指令
    Native,
    /// 拆分为三次贝塞尔曲线
    Approximate,
    /// 拒绝含圆弧的几何
    Reject,
}

/// 后端路径转换器
pub trait PathConverter: Sync {
    /// 后端原生路径对象
    type Output: Send;

    fn name(&self) -> &'static str;

    fn arc_policy(&self) -> ArcPolicy;

    fn convert(&self, geometry: &PathGeometry) -> Result<Self::Output, ConvertError>;
}

/// 并行转换多个几何，结果顺序与输入一致
pub fn convert_batch<C: PathConverter>(
    converter: &C,
    geometries: &[PathGeometry],
) -> Vec<Result<C::Output, ConvertError>> {
    geometries
        .par_iter()
        .map(|geometry| converter.convert(geometry))
        .collect()
}

/// 构造时校验策略是否可用
pub(crate) fn check_policy(
    backend: &'static str,
    policy: ArcPolicy,
    supports_native: bool,
) -> Result<ArcPolicy, ConvertError> {
    if policy == ArcPolicy::Native && !supports_native {
        return Err(ConvertError::UnsupportedPolicy { backend, policy });
    }
    Ok(policy)
}

pub(crate) fn unsupported(backend: &'static str, kind: SegmentKind) -> ConvertError {
    tracing::warn!(backend, %kind, "segment rejected by backend");
    ConvertError::UnsupportedSegmentKind { backend, kind }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zdraw_core::prelude::*;

    /// 闭合曲线图形 + 覆盖各种多段线段的开放图形
    pub(crate) fn sample_geometry(fill_rule: FillRule) -> PathGeometry {
        let mut builder = PathBuilder::new(fill_rule);
        builder.begin_figure_default(Point2::new(0.0, 0.0));
        builder.line_to(Point2::new(10.0, 0.0)).unwrap();
        builder
            .quadratic_bezier_to(Point2::new(15.0, 5.0), Point2::new(10.0, 10.0))
            .unwrap();
        builder
            .bezier_to(Point2::new(8.0, 12.0), Point2::new(2.0, 12.0), Point2::new(0.0, 10.0))
            .unwrap();
        builder.begin_figure(Point2::new(20.0, 0.0), false, false);
        builder
            .poly_line_to(vec![Point2::new(25.0, 0.0), Point2::new(25.0, 5.0)])
            .unwrap();
        builder
            .poly_quadratic_bezier_to(vec![
                Point2::new(27.0, 7.0),
                Point2::new(25.0, 9.0),
                Point2::new(23.0, 11.0),
                Point2::new(25.0, 13.0),
            ])
            .unwrap();
        builder
            .poly_bezier_to(vec![
                Point2::new(26.0, 14.0),
                Point2::new(27.0, 15.0),
                Point2::new(28.0, 16.0),
            ])
            .unwrap();
        builder.finish()
    }

    pub(crate) fn with_arc() -> PathGeometry {
        let mut builder = PathBuilder::new(FillRule::NonZero);
        builder.begin_figure_default(Point2::new(0.0, 0.0));
        builder.line_to(Point2::new(10.0, 0.0)).unwrap();
        builder
            .arc_to(
                Point2::new(0.0, 0.0),
                PathSize::new(5.0, 5.0),
                0.0,
                false,
                SweepDirection::Clockwise,
            )
            .unwrap();
        builder.finish()
    }

    /// 填充的三角形 + 不填充的闭合方块
    pub(crate) fn mixed_fill() -> PathGeometry {
        let mut builder = PathBuilder::new(FillRule::NonZero);
        builder.begin_figure(Point2::new(0.0, 0.0), true, true);
        builder.line_to(Point2::new(1.0, 0.0)).unwrap();
        builder.line_to(Point2::new(1.0, 1.0)).unwrap();
        builder.begin_figure(Point2::new(2.0, 0.0), false, true);
        builder
            .poly_line_to(vec![Point2::new(3.0, 0.0), Point2::new(3.0, 1.0), Point2::new(2.0, 1.0)])
            .unwrap();
        builder.finish()
    }

    pub(crate) fn unit_triangle() -> PathGeometry {
        let mut builder = PathBuilder::new(FillRule::NonZero);
        builder.begin_figure(Point2::new(0.0, 0.0), true, true);
        builder.line_to(Point2::new(1.0, 0.0)).unwrap();
        builder.line_to(Point2::new(1.0, 1.0)).unwrap();
        builder.finish()
    }

    #[test]
    fn test_fill_rule_round_trip_all_backends() {
        for rule in [FillRule::NonZero, FillRule::EvenOdd] {
            let geometry = sample_geometry(rule);
            let even_odd = rule == FillRule::EvenOdd;

            let svg = SvgConverter::new().convert(&geometry).unwrap();
            assert_eq!(svg.fill_rule == SvgFillRule::EvenOdd, even_odd);

            let lyon = LyonConverter::new().convert(&geometry).unwrap();
            assert_eq!(lyon.fill_rule == lyon_path::FillRule::EvenOdd, even_odd);

            let skia = SkiaConverter::new().convert(&geometry).unwrap();
            assert_eq!(skia.fill_rule == tiny_skia::FillRule::EvenOdd, even_odd);

            let pdf = PdfConverter::new().convert(&geometry).unwrap();
            assert_eq!(pdf.fill_rule == PdfFillRule::EvenOdd, even_odd);
        }
    }

    #[test]
    fn test_arc_rejection_is_an_error() {
        let geometry = with_arc();
        let skia = SkiaConverter::new();
        assert_eq!(skia.arc_policy(), ArcPolicy::Reject);
        assert_eq!(
            skia.convert(&geometry).unwrap_err(),
            ConvertError::UnsupportedSegmentKind {
                backend: "tiny-skia",
                kind: SegmentKind::Arc,
            }
        );

        let svg = SvgConverter::with_arc_policy(ArcPolicy::Reject).unwrap();
        assert!(matches!(
            svg.convert(&geometry),
            Err(ConvertError::UnsupportedSegmentKind { kind: SegmentKind::Arc, .. })
        ));
        let lyon = LyonConverter::with_arc_policy(ArcPolicy::Reject).unwrap();
        assert!(lyon.convert(&geometry).is_err());
        let pdf = PdfConverter::with_arc_policy(ArcPolicy::Reject).unwrap();
        assert!(pdf.convert(&geometry).is_err());
    }

    #[test]
    fn test_native_policy_only_where_supported() {
        assert!(LyonConverter::with_arc_policy(ArcPolicy::Native).is_err());
        assert!(SkiaConverter::with_arc_policy(ArcPolicy::Native).is_err());
        assert!(matches!(
            PdfConverter::with_arc_policy(ArcPolicy::Native),
            Err(ConvertError::UnsupportedPolicy { backend: "pdf", .. })
        ));
    }

    #[test]
    fn test_malformed_poly_segment_aborts() {
        let mut geometry = unit_triangle();
        geometry.figures[0]
            .segments
            .push(Segment::PolyCubicBezier(PolyCubicBezierSegment {
                points: vec![Point2::new(2.0, 2.0); 2],
                is_stroked: true,
                is_smooth_join: true,
            }));
        assert!(matches!(
            PdfConverter::new().convert(&geometry),
            Err(ConvertError::MalformedSegment(_))
        ));
        assert!(SvgConverter::new().convert(&geometry).is_err());
        assert!(LyonConverter::new().convert(&geometry).is_err());
        assert!(SkiaConverter::new().convert(&geometry).is_err());
    }

    #[test]
    fn test_convert_batch_preserves_order() {
        let geometries = vec![unit_triangle(), with_arc(), sample_geometry(FillRule::EvenOdd)];
        let results = convert_batch(&SkiaConverter::new(), &geometries);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }
}
