//! 图形渲染契约
//!
//! [`ShapeRenderer`] 与具体后端无关：每种图形一个绘制操作，绘制上下文由后端
//! 通过关联类型给出。样式优先级为 显式样式 > 图形自身样式 > 渲染状态中的回退样式，
//! 见 [`resolve_style`]。
//!
//! 后端可以缓存由样式和缩放派生出的原生对象（画笔、已变换的路径）。
//! [`ShapeRenderer::set_view`] 在缩放改变时调用 [`ShapeRenderer::clear_cache`]。

use crate::error::RenderError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use zdraw_core::math::{BoundingBox2, Point2, Vector2};
use zdraw_core::properties::{Color, ShapeStyle};
use zdraw_core::shapes::{
    ArcShape, CubicBezierShape, EllipseShape, ImageShape, LineShape, PathShape, PointShape,
    QuadraticBezierShape, RectangleShape, Shape, TextShape,
};

/// 允许的缩放范围
pub const MIN_ZOOM: f64 = 1e-6;
pub const MAX_ZOOM: f64 = 1e6;

/// 视图变换：屏幕 = 世界 × zoom + pan
///
/// 编辑器坐标与屏幕坐标同为 y 轴向下，无需翻转。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    /// 平移（屏幕像素）
    pub pan: Vector2,
    /// 缩放（像素/世界单位）
    pub zoom: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            pan: Vector2::zeros(),
            zoom: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn new(pan: Vector2, zoom: f64) -> Self {
        Self { pan, zoom }
    }

    pub fn world_to_screen(&self, point: Point2) -> Point2 {
        Point2::from(point.coords * self.zoom + self.pan)
    }

    pub fn screen_to_world(&self, point: Point2) -> Point2 {
        Point2::from((point.coords - self.pan) / self.zoom)
    }

    /// 世界长度转屏幕长度
    pub fn scale_length(&self, length: f64) -> f64 {
        length * self.zoom
    }

    /// 以屏幕点为不动点缩放
    pub fn zoom_at(&mut self, anchor: Point2, factor: f64) {
        let world = self.screen_to_world(anchor);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = anchor.coords - world.coords * self.zoom;
    }

    pub fn world_bounds_to_screen(&self, bounds: &BoundingBox2) -> BoundingBox2 {
        BoundingBox2::from_points([
            self.world_to_screen(bounds.min),
            self.world_to_screen(bounds.max),
        ])
    }
}

/// 网格参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSpec {
    /// 基础间距（世界单位）
    pub spacing: f64,
    pub color: Color,
    /// 坐标轴颜色
    pub axis_color: Color,
    /// 屏幕上允许的最小/最大网格间距（像素），超出时按 5 倍调整
    pub min_screen_spacing: f64,
    pub max_screen_spacing: f64,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            spacing: 50.0,
            color: Color::new(50, 50, 60),
            axis_color: Color::new(80, 80, 100),
            min_screen_spacing: 20.0,
            max_screen_spacing: 200.0,
        }
    }
}

impl GridSpec {
    /// 根据缩放级别调整网格间距（世界单位）
    ///
    /// 参数非有限或缩放过小导致间距溢出时返回非有限值，由调用方拒绝。
    pub fn effective_spacing(&self, zoom: f64) -> f64 {
        let mut spacing = self.spacing;
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !usable(spacing)
            || !usable(zoom)
            || !usable(self.min_screen_spacing)
            || !(self.min_screen_spacing < self.max_screen_spacing)
        {
            return spacing;
        }
        while spacing.is_finite() && spacing * zoom < self.min_screen_spacing {
            spacing *= 5.0;
        }
        while spacing.is_finite() && spacing * zoom > self.max_screen_spacing {
            spacing /= 5.0;
        }
        spacing
    }
}

/// 点图形的标记形状
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PointMarker {
    #[default]
    Dot,
    Square,
    Cross,
}

/// 非预乘 RGBA8 图像
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl ImageData {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, RenderError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(RenderError::InvalidImage(format!(
                "{}x{} image needs {} bytes, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// 纯色图像
    pub fn solid(width: u32, height: u32, color: Color) -> Result<Self, RenderError> {
        let pixels = [color.r, color.g, color.b, color.a].repeat(width as usize * height as usize);
        Self::new(width, height, pixels)
    }
}

/// 按键存放的图像，供 [`ImageShape`] 引用
#[derive(Debug, Clone, Default)]
pub struct ImageCache {
    images: HashMap<String, Arc<ImageData>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, image: ImageData) {
        self.images.insert(key.into(), Arc::new(image));
    }

    pub fn get(&self, key: &str) -> Option<&Arc<ImageData>> {
        self.images.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Arc<ImageData>> {
        self.images.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.images.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }
}

/// 渲染状态，绘制的输入，绘制过程不修改它
#[derive(Debug, Clone)]
pub struct RendererState {
    pub view: ViewTransform,
    pub images: ImageCache,
    /// 是否在图形周围绘制包围盒装饰
    pub draw_decorators: bool,
    /// 是否绘制点图形
    pub draw_points: bool,
    /// 点标记尺寸（屏幕像素）
    pub point_size: f64,
    pub point_marker: PointMarker,
    /// 点图形的回退样式
    pub point_style: ShapeStyle,
    /// 其他图形的回退样式
    pub default_style: ShapeStyle,
    pub decorator_style: ShapeStyle,
}

impl Default for RendererState {
    fn default() -> Self {
        Self {
            view: ViewTransform::default(),
            images: ImageCache::new(),
            draw_decorators: false,
            draw_points: true,
            point_size: 6.0,
            point_marker: PointMarker::Dot,
            point_style: ShapeStyle::stroked(Color::BLACK, 1.0).with_fill(Color::BLACK),
            default_style: ShapeStyle::default(),
            decorator_style: ShapeStyle::stroked(Color::new(0, 120, 215), 1.0)
                .with_dash(vec![4.0, 2.0], 0.0),
        }
    }
}

impl RendererState {
    /// 图形种类对应的回退样式
    pub fn fallback_style(&self, shape: &Shape) -> &ShapeStyle {
        match shape {
            Shape::Point(_) => &self.point_style,
            _ => &self.default_style,
        }
    }
}

/// 按优先级解析样式：显式样式 > 图形自身样式 > 回退样式
pub fn resolve_style<'a>(
    explicit: Option<&'a ShapeStyle>,
    own: Option<&'a ShapeStyle>,
    fallback: &'a ShapeStyle,
) -> &'a ShapeStyle {
    explicit.or(own).unwrap_or(fallback)
}

/// 与后端无关的图形渲染接口
///
/// `style` 参数为显式样式，`None` 时依次回退到图形自身样式和渲染状态。
pub trait ShapeRenderer {
    /// 后端绘制上下文
    type Context;

    fn state(&self) -> &RendererState;

    fn state_mut(&mut self) -> &mut RendererState;

    /// 以纯色填充屏幕矩形
    fn fill(&mut self, ctx: &mut Self::Context, rect: &BoundingBox2, color: Color) -> Result<(), RenderError>;

    /// 在屏幕矩形内绘制网格
    fn grid(&mut self, ctx: &mut Self::Context, grid: &GridSpec, rect: &BoundingBox2) -> Result<(), RenderError>;

    fn draw_point(&mut self, ctx: &mut Self::Context, shape: &PointShape, style: Option<&ShapeStyle>) -> Result<(), RenderError>;

    fn draw_line(&mut self, ctx: &mut Self::Context, shape: &LineShape, style: Option<&ShapeStyle>) -> Result<(), RenderError>;

    fn draw_rectangle(&mut self, ctx: &mut Self::Context, shape: &RectangleShape, style: Option<&ShapeStyle>) -> Result<(), RenderError>;

    fn draw_ellipse(&mut self, ctx: &mut Self::Context, shape: &EllipseShape, style: Option<&ShapeStyle>) -> Result<(), RenderError>;

    fn draw_arc(&mut self, ctx: &mut Self::Context, shape: &ArcShape, style: Option<&ShapeStyle>) -> Result<(), RenderError>;

    fn draw_cubic_bezier(&mut self, ctx: &mut Self::Context, shape: &CubicBezierShape, style: Option<&ShapeStyle>) -> Result<(), RenderError>;

    fn draw_quadratic_bezier(&mut self, ctx: &mut Self::Context, shape: &QuadraticBezierShape, style: Option<&ShapeStyle>) -> Result<(), RenderError>;

    fn draw_text(&mut self, ctx: &mut Self::Context, shape: &TextShape, style: Option<&ShapeStyle>) -> Result<(), RenderError>;

    fn draw_image(&mut self, ctx: &mut Self::Context, shape: &ImageShape, style: Option<&ShapeStyle>) -> Result<(), RenderError>;

    fn draw_path(&mut self, ctx: &mut Self::Context, shape: &PathShape, style: Option<&ShapeStyle>) -> Result<(), RenderError>;

    /// 绘制包围盒装饰（世界坐标）
    fn draw_decorator(&mut self, ctx: &mut Self::Context, bounds: &BoundingBox2) -> Result<(), RenderError>;

    /// 丢弃所有派生缓存
    fn clear_cache(&mut self);

    /// 按图形种类分派，并根据开关跳过点图形或追加装饰
    fn draw_shape(&mut self, ctx: &mut Self::Context, shape: &Shape, style: Option<&ShapeStyle>) -> Result<(), RenderError> {
        match shape {
            Shape::Point(s) => {
                if !self.state().draw_points {
                    return Ok(());
                }
                self.draw_point(ctx, s, style)?;
            }
            Shape::Line(s) => self.draw_line(ctx, s, style)?,
            Shape::Rectangle(s) => self.draw_rectangle(ctx, s, style)?,
            Shape::Ellipse(s) => self.draw_ellipse(ctx, s, style)?,
            Shape::Arc(s) => self.draw_arc(ctx, s, style)?,
            Shape::CubicBezier(s) => self.draw_cubic_bezier(ctx, s, style)?,
            Shape::QuadraticBezier(s) => self.draw_quadratic_bezier(ctx, s, style)?,
            Shape::Text(s) => self.draw_text(ctx, s, style)?,
            Shape::Image(s) => self.draw_image(ctx, s, style)?,
            Shape::Path(s) => self.draw_path(ctx, s, style)?,
        }

        if self.state().draw_decorators && !matches!(shape, Shape::Point(_)) {
            self.draw_decorator(ctx, &shape.bounding_box())?;
        }
        Ok(())
    }

    /// 更新视图变换，缩放改变时清空缓存
    fn set_view(&mut self, view: ViewTransform) {
        let zoom_changed = (self.state().view.zoom - view.zoom).abs() > f64::EPSILON;
        self.state_mut().view = view;
        if zoom_changed {
            self.clear_cache();
        }
    }
}
