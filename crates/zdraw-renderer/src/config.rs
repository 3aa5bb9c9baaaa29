//! 渲染配置
//!
//! 所有字段都有默认值，JSON 中缺省的字段取默认。

use crate::cache::CacheBudget;
use crate::convert::{ArcPolicy, LyonConverter, PdfConverter, SkiaConverter, SvgConverter};
use crate::error::ConfigError;
use crate::renderer::{
    GridSpec, ImageCache, PointMarker, RendererState, ViewTransform, MAX_ZOOM, MIN_ZOOM,
};
use crate::skia_renderer::SkiaRenderer;
use crate::text;
use fontdue::Font;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use zdraw_core::properties::{Color, ShapeStyle};

/// 各后端的圆弧策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcPolicies {
    pub svg: ArcPolicy,
    pub lyon: ArcPolicy,
    pub skia: ArcPolicy,
    pub pdf: ArcPolicy,
}

impl Default for ArcPolicies {
    fn default() -> Self {
        Self {
            svg: ArcPolicy::Native,
            lyon: ArcPolicy::Approximate,
            skia: ArcPolicy::Reject,
            pdf: ArcPolicy::Approximate,
        }
    }
}

/// NaN 视为非正数
fn is_positive(value: f64) -> bool {
    value > 0.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub arc_policies: ArcPolicies,
    /// 曲线展平容差（世界单位），用于轮廓与碰撞检测
    pub flatten_tolerance: f64,
    pub background: Color,
    pub show_grid: bool,
    pub grid: GridSpec,
    pub view: ViewTransform,
    pub draw_points: bool,
    pub draw_decorators: bool,
    /// 点标记尺寸（屏幕像素）
    pub point_size: f64,
    pub point_marker: PointMarker,
    pub point_style: ShapeStyle,
    pub default_style: ShapeStyle,
    pub decorator_style: ShapeStyle,
    /// 文本字体文件（TTF/OTF）
    pub font_path: Option<PathBuf>,
    /// 未指定字体文件时是否查找系统字体
    pub system_font_fallback: bool,
    pub cache_budget: CacheBudget,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let state = RendererState::default();
        Self {
            arc_policies: ArcPolicies::default(),
            flatten_tolerance: 0.1,
            background: Color::WHITE,
            show_grid: true,
            grid: GridSpec::default(),
            view: state.view,
            draw_points: state.draw_points,
            draw_decorators: state.draw_decorators,
            point_size: state.point_size,
            point_marker: state.point_marker,
            point_style: state.point_style,
            default_style: state.default_style,
            decorator_style: state.decorator_style,
            font_path: None,
            system_font_fallback: true,
            cache_budget: CacheBudget::default(),
        }
    }
}

impl RenderConfig {
    /// 从 JSON 解析并校验
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: RenderConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_positive(self.flatten_tolerance) {
            return Err(ConfigError::Invalid(format!(
                "flatten_tolerance must be positive, got {}",
                self.flatten_tolerance
            )));
        }
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&self.view.zoom) {
            return Err(ConfigError::Invalid(format!(
                "zoom must be within {}..={}, got {}",
                MIN_ZOOM, MAX_ZOOM, self.view.zoom
            )));
        }
        if !is_positive(self.grid.spacing) || !self.grid.spacing.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "grid spacing must be positive, got {}",
                self.grid.spacing
            )));
        }
        if !is_positive(self.grid.min_screen_spacing)
            || !(self.grid.min_screen_spacing < self.grid.max_screen_spacing)
        {
            return Err(ConfigError::Invalid(format!(
                "grid screen spacing range {}..{} is empty",
                self.grid.min_screen_spacing, self.grid.max_screen_spacing
            )));
        }
        if self.point_size < 0.0 {
            return Err(ConfigError::Invalid(format!("negative point size {}", self.point_size)));
        }
        Ok(())
    }

    pub fn svg_converter(&self) -> Result<SvgConverter, ConfigError> {
        Ok(SvgConverter::with_arc_policy(self.arc_policies.svg)?)
    }

    pub fn lyon_converter(&self) -> Result<LyonConverter, ConfigError> {
        Ok(LyonConverter::with_arc_policy(self.arc_policies.lyon)?)
    }

    pub fn skia_converter(&self) -> Result<SkiaConverter, ConfigError> {
        Ok(SkiaConverter::with_arc_policy(self.arc_policies.skia)?)
    }

    pub fn pdf_converter(&self) -> Result<PdfConverter, ConfigError> {
        Ok(PdfConverter::with_arc_policy(self.arc_policies.pdf)?)
    }

    /// 按 `font_path` 加载字体，未指定时按开关回退到系统字体
    ///
    /// 指定的文件无法加载是错误；系统字体找不到时返回 `None`。
    pub fn load_font(&self) -> Result<Option<Font>, ConfigError> {
        if let Some(path) = &self.font_path {
            return Ok(Some(text::load_font_file(path)?));
        }
        if !self.system_font_fallback {
            return Ok(None);
        }
        match text::load_system_font() {
            Ok(font) => Ok(Some(font)),
            Err(err) => {
                tracing::warn!(%err, "no system font, text will not be rendered");
                Ok(None)
            }
        }
    }

    /// 按配置创建 tiny-skia 渲染器，含缓存预算和字体
    pub fn skia_renderer(&self) -> Result<SkiaRenderer, ConfigError> {
        let mut renderer = SkiaRenderer::with_budget(self.renderer_state(), self.cache_budget);
        renderer.set_font(self.load_font()?);
        Ok(renderer)
    }

    /// 以配置初始化渲染状态，图像缓存为空
    pub fn renderer_state(&self) -> RendererState {
        RendererState {
            view: self.view,
            images: ImageCache::new(),
            draw_decorators: self.draw_decorators,
            draw_points: self.draw_points,
            point_size: self.point_size,
            point_marker: self.point_marker,
            point_style: self.point_style.clone(),
            default_style: self.default_style.clone(),
            decorator_style: self.decorator_style.clone(),
        }
    }
}
