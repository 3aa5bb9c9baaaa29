//! ZDraw 渲染层
//!
//! - [`convert`]：路径IR到 SVG / lyon / tiny-skia / PDF 原生路径的转换
//! - [`renderer`]：与后端无关的图形渲染契约与渲染状态
//! - [`skia_renderer`]：基于 tiny-skia 的契约实现
//! - [`text`]：基于 fontdue 的文本光栅化
//! - [`config`]：可序列化的渲染配置

pub mod cache;
pub mod config;
pub mod convert;
pub mod error;
pub mod renderer;
pub mod skia_renderer;
pub mod text;

pub use cache::{CacheBudget, LruCache};
pub use config::{ArcPolicies, RenderConfig};
pub use convert::{convert_batch, ArcPolicy, PathConverter};
pub use error::{ConfigError, ConvertError, RenderError};
pub use renderer::{
    resolve_style, GridSpec, ImageCache, ImageData, PointMarker, RendererState, ShapeRenderer,
    ViewTransform, MAX_ZOOM, MIN_ZOOM,
};
pub use skia_renderer::{new_pixmap, SkiaRenderer};
