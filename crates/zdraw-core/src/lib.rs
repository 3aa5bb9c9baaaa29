//! ZDraw 几何内核
//!
//! 与渲染后端无关的计算几何部分：
//! - 路径中间表示（IR）及其构建协议
//! - 贝塞尔升阶与椭圆弧参数化
//! - 二维向量代数
//! - 分离轴定理（SAT）碰撞检测
//!
//! # 示例
//!
//! ```rust
//! use zdraw_core::prelude::*;
//!
//! let a = [
//!     Point2::new(0.0, 0.0),
//!     Point2::new(1.0, 0.0),
//!     Point2::new(1.0, 1.0),
//!     Point2::new(0.0, 1.0),
//! ];
//! let b = a.map(|p| p + Vector2::new(0.5, 0.0));
//! assert!(sat::overlap(&a, &b).unwrap());
//! ```

pub mod arc;
pub mod bezier;
pub mod builder;
pub mod error;
pub mod math;
pub mod path;
pub mod properties;
pub mod sat;
pub mod shapes;

pub mod prelude {
    //! 常用类型的便捷导入
    pub use crate::builder::PathBuilder;
    pub use crate::error::{PathError, SatError};
    pub use crate::math::{BoundingBox2, Point2, Vector2, VectorExt, EPSILON};
    pub use crate::path::{
        ArcSegment, CubicBezierSegment, FillRule, LineSegment, PathFigure, PathGeometry, PathSize,
        PolyCubicBezierSegment, PolyLineSegment, PolyQuadraticBezierSegment,
        QuadraticBezierSegment, Segment, SegmentKind, SweepDirection,
    };
    pub use crate::properties::{Color, ShapeStyle};
    pub use crate::sat::{self, MinimumTranslationVector, Projection};
    pub use crate::shapes::{
        ArcShape, CubicBezierShape, EllipseShape, ImageShape, LineShape, PathShape, PointShape,
        QuadraticBezierShape, RectangleShape, Shape, ShapeId, TextShape,
    };
}
