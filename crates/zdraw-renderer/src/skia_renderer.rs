//! 基于 tiny-skia 的软件光栅化渲染器
//!
//! 路径按 [`ShapeId`] 缓存，缓存的是已按当前缩放换算、尚未平移的路径，平移在绘制时
//! 施加。缓存条目带有几何指纹（几何内容与缩放的哈希），图形被编辑后指纹不同，
//! 下次绘制时自动重建。画笔按样式与缩放缓存。三类缓存都有字节预算，超出时按
//! 最久未用淘汰，见 [`CacheBudget`]。

use crate::cache::{CacheBudget, LruCache};
use crate::convert::{PathConverter, SkiaConverter, SkiaPath};
use crate::error::RenderError;
use crate::renderer::{
    resolve_style, GridSpec, ImageData, PointMarker, RendererState, ShapeRenderer,
};
use crate::text;
use fontdue::Font;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::mem::size_of;
use std::sync::Arc;
use tiny_skia::{
    ColorU8, FillRule as SkiaFillRule, FilterQuality, IntSize, Paint, Path, PathBuilder, Pixmap,
    PixmapPaint, Rect, Stroke, StrokeDash, Transform,
};
use zdraw_core::math::{BoundingBox2, Point2};
use zdraw_core::path::PathGeometry;
use zdraw_core::properties::{Color, ShapeStyle};
use zdraw_core::shapes::{
    ArcShape, CubicBezierShape, EllipseShape, ImageShape, LineShape, PathShape, PointShape,
    QuadraticBezierShape, RectangleShape, ShapeId, TextShape,
};

/// 单张网格最多绘制的线条数
const MAX_GRID_LINES: f64 = 4096.0;

/// 装饰框相对包围盒的外扩（像素）
const DECORATOR_PADDING: f64 = 2.0;

/// 画笔缓存键，浮点字段按位比较
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StyleKey {
    stroke: Color,
    fill: Color,
    stroke_width: u64,
    dash_pattern: Vec<u64>,
    dash_offset: u64,
    zoom: u64,
}

impl StyleKey {
    fn new(style: &ShapeStyle, zoom: f64) -> Self {
        Self {
            stroke: style.stroke,
            fill: style.fill,
            stroke_width: style.stroke_width.to_bits(),
            dash_pattern: style.dash_pattern.iter().map(|d| d.to_bits()).collect(),
            dash_offset: style.dash_offset.to_bits(),
            zoom: zoom.to_bits(),
        }
    }
}

/// 已按缩放换算的填充与描边画笔
struct CachedPaint {
    fill: Option<Paint<'static>>,
    stroke_paint: Option<Paint<'static>>,
    stroke: Stroke,
}

impl CachedPaint {
    fn new(style: &ShapeStyle, zoom: f64) -> Self {
        let fill = (!style.fill.is_transparent()).then(|| solid_paint(style.fill));
        let stroke_paint = (!style.stroke.is_transparent() && style.stroke_width > 0.0)
            .then(|| solid_paint(style.stroke));

        let mut stroke = Stroke {
            width: (style.stroke_width * zoom) as f32,
            ..Default::default()
        };
        if style.is_dashed() {
            let dashes = style
                .dash_pattern
                .iter()
                .map(|d| (d * zoom) as f32)
                .collect();
            // 非法的虚线模式退化为实线
            stroke.dash = StrokeDash::new(dashes, (style.dash_offset * zoom) as f32);
        }

        Self {
            fill,
            stroke_paint,
            stroke,
        }
    }

    fn byte_size(&self) -> usize {
        size_of::<Self>() + self.stroke.dash.as_ref().map_or(0, |_| 64)
    }
}

/// 缓存的屏幕路径及其几何指纹
struct CachedPath {
    fingerprint: u64,
    path: Arc<SkiaPath>,
}

fn path_bytes(path: &Path) -> usize {
    path.points().len() * size_of::<tiny_skia::Point>() + path.verbs().len()
}

fn skia_path_bytes(path: &SkiaPath) -> usize {
    size_of::<SkiaPath>() + path_bytes(&path.path) + path.fill_path.as_ref().map_or(0, path_bytes)
}

fn solid_paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

fn screen_rect(rect: &BoundingBox2) -> Result<Rect, RenderError> {
    Rect::from_ltrb(
        rect.min.x as f32,
        rect.min.y as f32,
        rect.max.x as f32,
        rect.max.y as f32,
    )
    .ok_or_else(|| RenderError::Degenerate(format!("invalid rectangle {:?}", rect)))
}

/// 创建画布
pub fn new_pixmap(width: u32, height: u32) -> Result<Pixmap, RenderError> {
    Pixmap::new(width, height)
        .ok_or_else(|| RenderError::Degenerate(format!("invalid pixmap size {}x{}", width, height)))
}

/// 非预乘 RGBA 转为 tiny-skia 的预乘像素图
fn image_to_pixmap(image: &ImageData) -> Result<Pixmap, RenderError> {
    let size = IntSize::from_wh(image.width, image.height)
        .ok_or_else(|| RenderError::InvalidImage("zero sized image".to_string()))?;
    let data = image
        .pixels
        .chunks_exact(4)
        .flat_map(|px| {
            let c = ColorU8::from_rgba(px[0], px[1], px[2], px[3]).premultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    Pixmap::from_vec(data, size)
        .ok_or_else(|| RenderError::InvalidImage(format!("{}x{}", image.width, image.height)))
}

/// tiny-skia 渲染器，绘制上下文为 [`Pixmap`]
pub struct SkiaRenderer {
    state: RendererState,
    converter: SkiaConverter,
    paths: LruCache<ShapeId, CachedPath>,
    paints: LruCache<StyleKey, Arc<CachedPaint>>,
    images: LruCache<String, Arc<Pixmap>>,
    font: Option<Arc<Font>>,
}

impl Default for SkiaRenderer {
    fn default() -> Self {
        Self::new(RendererState::default())
    }
}

impl SkiaRenderer {
    pub fn new(state: RendererState) -> Self {
        Self::with_budget(state, CacheBudget::default())
    }

    pub fn with_budget(state: RendererState, budget: CacheBudget) -> Self {
        Self {
            state,
            converter: SkiaConverter::approximating(),
            paths: LruCache::new(budget.paths),
            paints: LruCache::new(budget.paints),
            images: LruCache::new(budget.images),
            font: None,
        }
    }

    pub fn with_font(mut self, font: Font) -> Self {
        self.set_font(Some(font));
        self
    }

    /// 设置文本字体，`None` 时文本绘制返回 [`RenderError::FontMissing`]
    pub fn set_font(&mut self, font: Option<Font>) {
        self.font = font.map(Arc::new);
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn set_budget(&mut self, budget: CacheBudget) {
        self.paths.set_max_bytes(budget.paths);
        self.paints.set_max_bytes(budget.paints);
        self.images.set_max_bytes(budget.images);
    }

    pub fn cached_path_count(&self) -> usize {
        self.paths.len()
    }

    pub fn cached_path_bytes(&self) -> usize {
        self.paths.total_bytes()
    }

    pub fn cached_paint_count(&self) -> usize {
        self.paints.len()
    }

    pub fn cached_image_bytes(&self) -> usize {
        self.images.total_bytes()
    }

    /// 图形被删除后丢弃它的缓存路径
    pub fn evict_shape(&mut self, id: ShapeId) -> bool {
        self.paths.remove(&id).is_some()
    }

    fn zoom_transform(&self) -> Transform {
        let zoom = self.state.view.zoom as f32;
        Transform::from_scale(zoom, zoom)
    }

    fn pan_transform(&self) -> Transform {
        let pan = self.state.view.pan;
        Transform::from_translate(pan.x as f32, pan.y as f32)
    }

    /// 取缓存的缩放后路径，指纹不符时由世界坐标几何重建
    fn screen_path(&mut self, id: ShapeId, geometry: &PathGeometry) -> Result<Arc<SkiaPath>, RenderError> {
        let mut hasher = DefaultHasher::new();
        geometry.fingerprint().hash(&mut hasher);
        self.state.view.zoom.to_bits().hash(&mut hasher);
        let fingerprint = hasher.finish();

        if let Some(cached) = self.paths.get(&id) {
            if cached.fingerprint == fingerprint {
                return Ok(Arc::clone(&cached.path));
            }
            tracing::trace!(id = id.raw(), "geometry changed, rebuilding cached path");
        }

        let native = self.converter.convert(geometry)?;
        let zoom = self.zoom_transform();
        let path = native
            .path
            .transform(zoom)
            .ok_or_else(|| RenderError::Degenerate(format!("shape {} vanished after transform", id.raw())))?;
        let fill_path = native.fill_path.and_then(|p| p.transform(zoom));
        let path = Arc::new(SkiaPath {
            path,
            fill_path,
            fill_rule: native.fill_rule,
        });
        self.paths.insert(
            id,
            CachedPath {
                fingerprint,
                path: Arc::clone(&path),
            },
            skia_path_bytes(&path),
        );
        Ok(path)
    }

    fn paint(&mut self, style: &ShapeStyle) -> Arc<CachedPaint> {
        let zoom = self.state.view.zoom;
        let key = StyleKey::new(style, zoom);
        if let Some(paint) = self.paints.get(&key) {
            return Arc::clone(paint);
        }
        let paint = Arc::new(CachedPaint::new(style, zoom));
        let bytes = paint.byte_size();
        self.paints.insert(key, Arc::clone(&paint), bytes);
        paint
    }

    fn image_pixmap(&mut self, key: &str) -> Result<Arc<Pixmap>, RenderError> {
        let key = key.to_string();
        if let Some(pixmap) = self.images.get(&key) {
            return Ok(Arc::clone(pixmap));
        }
        let image = self
            .state
            .images
            .get(&key)
            .ok_or_else(|| RenderError::ImageNotFound(key.clone()))?;
        let pixmap = Arc::new(image_to_pixmap(image)?);
        let bytes = pixmap.data().len();
        self.images.insert(key, Arc::clone(&pixmap), bytes);
        Ok(pixmap)
    }

    /// 解析样式并绘制图形的路径
    fn draw_geometry(
        &mut self,
        ctx: &mut Pixmap,
        id: ShapeId,
        explicit: Option<&ShapeStyle>,
        own: Option<&ShapeStyle>,
        geometry: &PathGeometry,
    ) -> Result<(), RenderError> {
        let style = resolve_style(explicit, own, &self.state.default_style).clone();
        let path = self.screen_path(id, geometry)?;
        let paint = self.paint(&style);
        paint_path(ctx, &path, &paint, self.pan_transform());
        Ok(())
    }

    /// 点标记的指纹：位置、尺寸和标记形状
    fn marker_fingerprint(&self, position: Point2) -> u64 {
        let mut hasher = DefaultHasher::new();
        position.x.to_bits().hash(&mut hasher);
        position.y.to_bits().hash(&mut hasher);
        self.state.point_size.to_bits().hash(&mut hasher);
        self.state.point_marker.hash(&mut hasher);
        self.state.view.zoom.to_bits().hash(&mut hasher);
        hasher.finish()
    }

    /// 点标记尺寸与缩放无关，只有位置随缩放换算
    fn marker_path(&self, position: Point2) -> Result<SkiaPath, RenderError> {
        let center = position * self.state.view.zoom;
        let (x, y) = (center.x as f32, center.y as f32);
        let half = (self.state.point_size / 2.0) as f32;

        let (path, filled) = match self.state.point_marker {
            PointMarker::Dot => (PathBuilder::from_circle(x, y, half), true),
            PointMarker::Square => (
                Rect::from_xywh(x - half, y - half, half * 2.0, half * 2.0).map(PathBuilder::from_rect),
                true,
            ),
            PointMarker::Cross => {
                let mut pb = PathBuilder::new();
                pb.move_to(x - half, y);
                pb.line_to(x + half, y);
                pb.move_to(x, y - half);
                pb.line_to(x, y + half);
                (pb.finish(), false)
            }
        };

        path.map(|path| SkiaPath {
            fill_path: filled.then(|| path.clone()),
            path,
            fill_rule: SkiaFillRule::Winding,
        })
        .ok_or_else(|| RenderError::Degenerate(format!("point size {}", self.state.point_size)))
    }
}

/// 只填充 `is_filled` 的图形，描边完整路径
fn paint_path(ctx: &mut Pixmap, path: &SkiaPath, paint: &CachedPaint, transform: Transform) {
    if let (Some(fill), Some(fill_path)) = (&paint.fill, &path.fill_path) {
        ctx.fill_path(fill_path, fill, path.fill_rule, transform, None);
    }
    if let Some(stroke_paint) = &paint.stroke_paint {
        ctx.stroke_path(&path.path, stroke_paint, &paint.stroke, transform, None);
    }
}

impl ShapeRenderer for SkiaRenderer {
    type Context = Pixmap;

    fn state(&self) -> &RendererState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RendererState {
        &mut self.state
    }

    fn fill(&mut self, ctx: &mut Pixmap, rect: &BoundingBox2, color: Color) -> Result<(), RenderError> {
        let rect = screen_rect(rect)?;
        ctx.fill_rect(rect, &solid_paint(color), Transform::identity(), None);
        Ok(())
    }

    fn grid(&mut self, ctx: &mut Pixmap, grid: &GridSpec, rect: &BoundingBox2) -> Result<(), RenderError> {
        let view = self.state.view;
        let spacing = grid.effective_spacing(view.zoom);
        if !spacing.is_finite() || spacing <= 0.0 || view.zoom <= 0.0 {
            return Err(RenderError::Degenerate(format!("grid spacing {}", spacing)));
        }

        // 计算可见范围
        let top_left = view.screen_to_world(rect.min);
        let bottom_right = view.screen_to_world(rect.max);
        let start_x = (top_left.x / spacing).floor() * spacing;
        let end_x = (bottom_right.x / spacing).ceil() * spacing;
        let start_y = (top_left.y / spacing).floor() * spacing;
        let end_y = (bottom_right.y / spacing).ceil() * spacing;

        // NaN 也在这里拦下
        let dense = |span: f64| !(span / spacing <= MAX_GRID_LINES);
        if dense(end_x - start_x) || dense(end_y - start_y) {
            return Err(RenderError::Degenerate(format!("grid too dense: spacing {}", spacing)));
        }

        let mut lines = PathBuilder::new();
        let mut axes = PathBuilder::new();
        let axis_epsilon = spacing * 1e-6;

        // 垂直线
        let mut x = start_x;
        while x <= end_x {
            let screen_x = view.world_to_screen(Point2::new(x, 0.0)).x;
            if screen_x >= rect.min.x && screen_x <= rect.max.x {
                let pb = if x.abs() < axis_epsilon { &mut axes } else { &mut lines };
                pb.move_to(screen_x as f32, rect.min.y as f32);
                pb.line_to(screen_x as f32, rect.max.y as f32);
            }
            x += spacing;
        }

        // 水平线
        let mut y = start_y;
        while y <= end_y {
            let screen_y = view.world_to_screen(Point2::new(0.0, y)).y;
            if screen_y >= rect.min.y && screen_y <= rect.max.y {
                let pb = if y.abs() < axis_epsilon { &mut axes } else { &mut lines };
                pb.move_to(rect.min.x as f32, screen_y as f32);
                pb.line_to(rect.max.x as f32, screen_y as f32);
            }
            y += spacing;
        }

        let stroke = Stroke {
            width: 1.0,
            ..Default::default()
        };
        for (pb, color) in [(lines, grid.color), (axes, grid.axis_color)] {
            if let Some(path) = pb.finish() {
                ctx.stroke_path(&path, &solid_paint(color), &stroke, Transform::identity(), None);
            }
        }
        Ok(())
    }

    fn draw_point(&mut self, ctx: &mut Pixmap, shape: &PointShape, style: Option<&ShapeStyle>) -> Result<(), RenderError> {
        let style = resolve_style(style, shape.style.as_ref(), &self.state.point_style).clone();
        let fingerprint = self.marker_fingerprint(shape.position);
        let cached = self
            .paths
            .get(&shape.id)
            .filter(|cached| cached.fingerprint == fingerprint)
            .map(|cached| Arc::clone(&cached.path));
        let path = match cached {
            Some(path) => path,
            None => {
                let path = Arc::new(self.marker_path(shape.position)?);
                let bytes = skia_path_bytes(&path);
                self.paths.insert(
                    shape.id,
                    CachedPath {
                        fingerprint,
                        path: Arc::clone(&path),
                    },
                    bytes,
                );
                path
            }
        };
        let paint = self.paint(&style);
        paint_path(ctx, &path, &paint, self.pan_transform());
        Ok(())
    }

    fn draw_line(&mut self, ctx: &mut Pixmap, shape: &LineShape, style: Option<&ShapeStyle>) -> Result<(), RenderError> {
        self.draw_geometry(ctx, shape.id, style, shape.style.as_ref(), &shape.to_geometry())
    }

    fn draw_rectangle(&mut self, ctx: &mut Pixmap, shape: &RectangleShape, style: Option<&ShapeStyle>) -> Result<(), RenderError> {
        self.draw_geometry(ctx, shape.id, style, shape.style.as_ref(), &shape.to_geometry())
    }

    fn draw_ellipse(&mut self, ctx: &mut Pixmap, shape: &EllipseShape, style: Option<&ShapeStyle>) -> Result<(), RenderError> {
        self.draw_geometry(ctx, shape.id, style, shape.style.as_ref(), &shape.to_geometry())
    }

    fn draw_arc(&mut self, ctx: &mut Pixmap, shape: &ArcShape, style: Option<&ShapeStyle>) -> Result<(), RenderError> {
        self.draw_geometry(ctx, shape.id, style, shape.style.as_ref(), &shape.to_geometry())
    }

    fn draw_cubic_bezier(&mut self, ctx: &mut Pixmap, shape: &CubicBezierShape, style: Option<&ShapeStyle>) -> Result<(), RenderError> {
        self.draw_geometry(ctx, shape.id, style, shape.style.as_ref(), &shape.to_geometry())
    }

    fn draw_quadratic_bezier(&mut self, ctx: &mut Pixmap, shape: &QuadraticBezierShape, style: Option<&ShapeStyle>) -> Result<(), RenderError> {
        self.draw_geometry(ctx, shape.id, style, shape.style.as_ref(), &shape.to_geometry())
    }

    /// 文本以填充色绘制，填充透明时用描边色；字号为 `height` 换算到屏幕的像素数
    fn draw_text(&mut self, ctx: &mut Pixmap, shape: &TextShape, style: Option<&ShapeStyle>) -> Result<(), RenderError> {
        let font = self.font.clone().ok_or(RenderError::FontMissing)?;
        let color = resolve_style(style, shape.style.as_ref(), &self.state.default_style).text_color();

        let view = self.state.view;
        let px = view.scale_length(shape.height) as f32;
        if !(px.is_finite() && px > 0.0) {
            return Err(RenderError::Degenerate(format!("text height {}", shape.height)));
        }
        let origin = view.world_to_screen(shape.position);
        let glyphs = text::rasterize_text(&font, &shape.content, px, (origin.x as f32, origin.y as f32));
        tracing::trace!(id = shape.id.raw(), glyphs = glyphs.len(), px, "drawing text");
        text::composite_glyphs(ctx, &glyphs, color);
        Ok(())
    }

    fn draw_image(&mut self, ctx: &mut Pixmap, shape: &ImageShape, _style: Option<&ShapeStyle>) -> Result<(), RenderError> {
        let pixmap = self.image_pixmap(&shape.key)?;
        let screen = self.state.view.world_bounds_to_screen(&shape.bounds);
        if screen.width() <= 0.0 || screen.height() <= 0.0 {
            return Err(RenderError::Degenerate(format!("image '{}' has empty bounds", shape.key)));
        }

        let transform = Transform::from_row(
            (screen.width() / pixmap.width() as f64) as f32,
            0.0,
            0.0,
            (screen.height() / pixmap.height() as f64) as f32,
            screen.min.x as f32,
            screen.min.y as f32,
        );
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..Default::default()
        };
        let source: &Pixmap = &pixmap;
        ctx.draw_pixmap(0, 0, source.as_ref(), &paint, transform, None);
        Ok(())
    }

    fn draw_path(&mut self, ctx: &mut Pixmap, shape: &PathShape, style: Option<&ShapeStyle>) -> Result<(), RenderError> {
        self.draw_geometry(ctx, shape.id, style, shape.style.as_ref(), &shape.geometry)
    }

    fn draw_decorator(&mut self, ctx: &mut Pixmap, bounds: &BoundingBox2) -> Result<(), RenderError> {
        let screen = self.state.view.world_bounds_to_screen(bounds);
        let padded = BoundingBox2::new(
            Point2::new(screen.min.x - DECORATOR_PADDING, screen.min.y - DECORATOR_PADDING),
            Point2::new(screen.max.x + DECORATOR_PADDING, screen.max.y + DECORATOR_PADDING),
        );
        let rect = PathBuilder::from_rect(screen_rect(&padded)?);
        let path = SkiaPath {
            fill_path: Some(rect.clone()),
            path: rect,
            fill_rule: SkiaFillRule::Winding,
        };
        let style = self.state.decorator_style.clone();
        let paint = self.paint(&style);
        paint_path(ctx, &path, &paint, Transform::identity());
        Ok(())
    }

    fn clear_cache(&mut self) {
        tracing::debug!(
            paths = self.paths.len(),
            paints = self.paints.len(),
            images = self.images.len(),
            "clearing renderer caches"
        );
        self.paths.clear();
        self.paints.clear();
        self.images.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::ViewTransform;
    use zdraw_core::builder::PathBuilder;
    use zdraw_core::math::Vector2;
    use zdraw_core::path::{FillRule, Segment};
    use zdraw_core::shapes::Shape;

    fn rgba(pixmap: &Pixmap, x: u32, y: u32) -> [u8; 4] {
        let c = pixmap.pixel(x, y).unwrap();
        [c.red(), c.green(), c.blue(), c.alpha()]
    }

    fn red_square() -> RectangleShape {
        RectangleShape::new(Point2::new(10.0, 10.0), Point2::new(30.0, 30.0))
            .with_style(ShapeStyle::stroked(Color::RED, 1.0).with_fill(Color::RED))
    }

    #[test]
    fn test_fill_and_rectangle() {
        let mut pixmap = new_pixmap(64, 64).unwrap();
        let mut renderer = SkiaRenderer::default();
        let full = BoundingBox2::new(Point2::origin(), Point2::new(64.0, 64.0));
        renderer.fill(&mut pixmap, &full, Color::WHITE).unwrap();
        renderer.draw_rectangle(&mut pixmap, &red_square(), None).unwrap();

        assert_eq!(rgba(&pixmap, 20, 20), [255, 0, 0, 255]);
        assert_eq!(rgba(&pixmap, 50, 50), [255, 255, 255, 255]);
    }

    #[test]
    fn test_explicit_style_wins() {
        let mut pixmap = new_pixmap(64, 64).unwrap();
        let mut renderer = SkiaRenderer::default();
        let blue = ShapeStyle::stroked(Color::BLUE, 1.0).with_fill(Color::BLUE);
        renderer
            .draw_rectangle(&mut pixmap, &red_square(), Some(&blue))
            .unwrap();
        assert_eq!(rgba(&pixmap, 20, 20), [0, 0, 255, 255]);
    }

    #[test]
    fn test_direct_zoom_change_rebuilds_path() {
        let square = red_square();
        let mut renderer = SkiaRenderer::default();
        let mut pixmap = new_pixmap(64, 64).unwrap();
        renderer.draw_rectangle(&mut pixmap, &square, None).unwrap();
        assert_eq!(renderer.cached_path_count(), 1);
        assert_eq!(renderer.cached_paint_count(), 1);

        // 绕过 set_view 直接改缩放，缓存指纹不符，路径按新缩放重建
        renderer.state_mut().view.zoom = 2.0;
        let mut zoomed = new_pixmap(64, 64).unwrap();
        renderer.draw_rectangle(&mut zoomed, &square, None).unwrap();
        assert_eq!(rgba(&zoomed, 50, 50), [255, 0, 0, 255]);
        assert_eq!(renderer.cached_path_count(), 1);

        renderer.clear_cache();
        assert_eq!(renderer.cached_path_count(), 0);
        assert_eq!(renderer.cached_paint_count(), 0);
    }

    #[test]
    fn test_edited_path_is_redrawn() {
        let mut builder = PathBuilder::new(FillRule::NonZero);
        builder.begin_figure(Point2::new(0.0, 0.0), true, true);
        builder
            .poly_line_to(vec![Point2::new(20.0, 0.0), Point2::new(20.0, 20.0), Point2::new(0.0, 20.0)])
            .unwrap();
        let mut shape = PathShape::new(builder.finish());
        shape.style = Some(ShapeStyle::stroked(Color::RED, 1.0).with_fill(Color::RED));

        let mut renderer = SkiaRenderer::default();
        let mut before = new_pixmap(64, 64).unwrap();
        renderer.draw_path(&mut before, &shape, None).unwrap();
        assert_eq!(rgba(&before, 50, 50)[3], 0);

        shape
            .geometry
            .replace_segment(
                0,
                0,
                Segment::poly_line(vec![Point2::new(60.0, 0.0), Point2::new(60.0, 60.0), Point2::new(0.0, 60.0)]),
            )
            .unwrap();
        let mut after = new_pixmap(64, 64).unwrap();
        renderer.draw_path(&mut after, &shape, None).unwrap();
        assert_eq!(rgba(&after, 50, 50), [255, 0, 0, 255]);
        assert_eq!(renderer.cached_path_count(), 1);
    }

    #[test]
    fn test_unfilled_figure_is_stroked_only() {
        let mut builder = PathBuilder::new(FillRule::NonZero);
        builder.begin_figure(Point2::new(4.0, 4.0), true, true);
        builder
            .poly_line_to(vec![Point2::new(20.0, 4.0), Point2::new(20.0, 20.0), Point2::new(4.0, 20.0)])
            .unwrap();
        builder.begin_figure(Point2::new(30.0, 4.0), false, true);
        builder
            .poly_line_to(vec![Point2::new(60.0, 4.0), Point2::new(60.0, 34.0), Point2::new(30.0, 34.0)])
            .unwrap();
        let mut shape = PathShape::new(builder.finish());
        shape.style = Some(ShapeStyle::stroked(Color::BLUE, 1.0).with_fill(Color::RED));

        let mut renderer = SkiaRenderer::default();
        let mut pixmap = new_pixmap(64, 64).unwrap();
        renderer.draw_path(&mut pixmap, &shape, None).unwrap();

        assert_eq!(rgba(&pixmap, 12, 12), [255, 0, 0, 255]);
        // 未填充的方形内部透明，边框仍被描边
        assert_eq!(rgba(&pixmap, 45, 19)[3], 0);
        assert!(rgba(&pixmap, 45, 4)[3] > 0);
    }

    #[test]
    fn test_path_cache_respects_budget() {
        let budget = CacheBudget {
            paths: 2048,
            ..Default::default()
        };
        let mut renderer = SkiaRenderer::with_budget(RendererState::default(), budget);
        let mut pixmap = new_pixmap(64, 64).unwrap();
        for i in 0..200 {
            let x = (i % 50) as f64;
            let shape = RectangleShape::new(Point2::new(x, 0.0), Point2::new(x + 5.0, 5.0));
            renderer.draw_rectangle(&mut pixmap, &shape, None).unwrap();
        }
        assert!(renderer.cached_path_bytes() <= 2048);
        assert!(renderer.cached_path_count() < 200);
        assert!(renderer.cached_path_count() > 0);

        renderer.set_budget(CacheBudget {
            paths: 0,
            ..Default::default()
        });
        assert_eq!(renderer.cached_path_count(), 0);
    }

    #[test]
    fn test_evict_shape() {
        let square = red_square();
        let mut renderer = SkiaRenderer::default();
        let mut pixmap = new_pixmap(64, 64).unwrap();
        renderer.draw_rectangle(&mut pixmap, &square, None).unwrap();
        assert!(renderer.evict_shape(square.id));
        assert!(!renderer.evict_shape(square.id));
        assert_eq!(renderer.cached_path_bytes(), 0);
    }

    #[test]
    fn test_point_marker_change_rebuilds() {
        let point = PointShape::new(Point2::new(8.0, 8.0));
        let mut renderer = SkiaRenderer::default();
        let mut dot = new_pixmap(16, 16).unwrap();
        renderer.draw_point(&mut dot, &point, None).unwrap();

        renderer.state_mut().point_marker = PointMarker::Square;
        renderer.state_mut().point_size = 10.0;
        let mut square = new_pixmap(16, 16).unwrap();
        renderer.draw_point(&mut square, &point, None).unwrap();
        // 方形标记覆盖圆点够不到的角
        assert_eq!(rgba(&square, 4, 4), [0, 0, 0, 255]);
        assert_eq!(rgba(&dot, 4, 4)[3], 0);
    }

    #[test]
    fn test_set_view_clears_on_zoom_change() {
        let mut renderer = SkiaRenderer::default();
        let mut pixmap = new_pixmap(64, 64).unwrap();
        renderer.draw_rectangle(&mut pixmap, &red_square(), None).unwrap();

        renderer.set_view(ViewTransform::new(Vector2::new(5.0, 0.0), 1.0));
        assert_eq!(renderer.cached_path_count(), 1);
        renderer.set_view(ViewTransform::new(Vector2::zeros(), 0.5));
        assert_eq!(renderer.cached_path_count(), 0);
        assert_eq!(renderer.cached_paint_count(), 0);
    }

    #[test]
    fn test_pan_moves_cached_path() {
        let square = red_square();
        let mut renderer = SkiaRenderer::default();
        let mut pixmap = new_pixmap(64, 64).unwrap();
        renderer.draw_rectangle(&mut pixmap, &square, None).unwrap();

        renderer.set_view(ViewTransform::new(Vector2::new(25.0, 0.0), 1.0));
        let mut panned = new_pixmap(64, 64).unwrap();
        renderer.draw_rectangle(&mut panned, &square, None).unwrap();
        assert_eq!(renderer.cached_path_count(), 1);
        assert_eq!(rgba(&panned, 45, 20), [255, 0, 0, 255]);
        assert_eq!(rgba(&panned, 20, 20)[3], 0);
    }

    #[test]
    fn test_ellipse_is_filled_inside_only() {
        let ellipse = EllipseShape::new(Point2::new(0.0, 0.0), Point2::new(40.0, 20.0))
            .with_style(ShapeStyle::stroked(Color::GREEN, 1.0).with_fill(Color::GREEN));
        let mut pixmap = new_pixmap(64, 64).unwrap();
        let mut renderer = SkiaRenderer::default();
        renderer.draw_ellipse(&mut pixmap, &ellipse, None).unwrap();

        assert_eq!(rgba(&pixmap, 20, 10), [0, 255, 0, 255]);
        assert_eq!(rgba(&pixmap, 1, 1)[3], 0);
    }

    #[test]
    fn test_text_needs_font() {
        let mut pixmap = new_pixmap(16, 16).unwrap();
        let mut renderer = SkiaRenderer::default();
        let text = TextShape::new(Point2::new(1.0, 1.0), "hi", 4.0);
        assert!(!renderer.has_font());
        assert!(matches!(
            renderer.draw_text(&mut pixmap, &text, None),
            Err(RenderError::FontMissing)
        ));
    }

    #[test]
    fn test_text_draws_inside_its_bounds() {
        // 无系统字体的环境下跳过
        let Ok(font) = crate::text::load_system_font() else {
            return;
        };
        let mut renderer = SkiaRenderer::default().with_font(font);
        renderer.state_mut().view = ViewTransform::new(Vector2::new(8.0, 0.0), 2.0);
        let text = TextShape::new(Point2::new(0.0, 4.0), "Hello", 12.0)
            .with_style(ShapeStyle::stroked(Color::BLUE, 1.0));
        let mut pixmap = new_pixmap(200, 64).unwrap();
        renderer.draw_text(&mut pixmap, &text, None).unwrap();

        let ink: Vec<(u32, u32)> = (0..64)
            .flat_map(|y| (0..200).map(move |x| (x, y)))
            .filter(|&(x, y)| rgba(&pixmap, x, y)[3] > 0)
            .collect();
        assert!(!ink.is_empty());
        // 原点 (0, 4) 在屏幕 (8, 8)，字号 24px
        assert!(ink.iter().all(|&(x, y)| x >= 7 && y >= 7 && y <= 8 + 24 + 8));
        let (x, y) = ink[ink.len() / 2];
        let px = rgba(&pixmap, x, y);
        assert_eq!(px[0], 0);
        assert!(px[2] > 0);
    }

    #[test]
    fn test_image_lookup() {
        let mut state = RendererState::default();
        state
            .images
            .insert("tile", ImageData::solid(2, 2, Color::BLUE).unwrap());
        let mut renderer = SkiaRenderer::new(state);
        let mut pixmap = new_pixmap(32, 32).unwrap();

        let image = ImageShape::new(Point2::new(0.0, 0.0), Point2::new(16.0, 16.0), "tile");
        renderer.draw_image(&mut pixmap, &image, None).unwrap();
        assert_eq!(rgba(&pixmap, 8, 8), [0, 0, 255, 255]);
        assert_eq!(rgba(&pixmap, 24, 24)[3], 0);

        let missing = ImageShape::new(Point2::new(0.0, 0.0), Point2::new(4.0, 4.0), "missing");
        assert!(matches!(
            renderer.draw_image(&mut pixmap, &missing, None),
            Err(RenderError::ImageNotFound(_))
        ));
    }

    #[test]
    fn test_points_toggle() {
        let point = Shape::Point(PointShape::new(Point2::new(8.0, 8.0)));
        let mut renderer = SkiaRenderer::default();

        let mut hidden = new_pixmap(16, 16).unwrap();
        renderer.state_mut().draw_points = false;
        renderer.draw_shape(&mut hidden, &point, None).unwrap();
        assert_eq!(rgba(&hidden, 8, 8)[3], 0);

        let mut shown = new_pixmap(16, 16).unwrap();
        renderer.state_mut().draw_points = true;
        renderer.draw_shape(&mut shown, &point, None).unwrap();
        assert_eq!(rgba(&shown, 8, 8), [0, 0, 0, 255]);
    }

    #[test]
    fn test_grid_draws_axes() {
        let mut renderer = SkiaRenderer::default();
        renderer.state_mut().view = ViewTransform::new(Vector2::new(32.0, 32.0), 1.0);
        let mut pixmap = new_pixmap(64, 64).unwrap();
        let grid = GridSpec {
            spacing: 20.0,
            ..Default::default()
        };
        let rect = BoundingBox2::new(Point2::origin(), Point2::new(64.0, 64.0));
        renderer.grid(&mut pixmap, &grid, &rect).unwrap();

        // 世界原点在屏幕 (32, 32)，坐标轴经过该点
        assert!(rgba(&pixmap, 32, 10)[3] > 0);
        assert!(rgba(&pixmap, 10, 32)[3] > 0);
        assert_eq!(rgba(&pixmap, 41, 41)[3], 0);
    }
}
