//! 转换与渲染错误定义

use crate::convert::ArcPolicy;
use thiserror::Error;
use zdraw_core::error::PathError;
use zdraw_core::path::SegmentKind;

/// 路径转换错误，任何错误都会中止整次转换
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error("{backend}: unsupported segment kind {kind}")]
    UnsupportedSegmentKind {
        backend: &'static str,
        kind: SegmentKind,
    },

    #[error("{backend}: arc policy {policy:?} is not available for this backend")]
    UnsupportedPolicy {
        backend: &'static str,
        policy: ArcPolicy,
    },

    #[error("Malformed segment: {0}")]
    MalformedSegment(#[from] PathError),

    #[error("{0}: geometry produced an empty native path")]
    EmptyPath(&'static str),
}

/// 图形渲染错误
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Conversion error: {0}")]
    Convert(#[from] ConvertError),

    #[error("Image not found in cache: {0}")]
    ImageNotFound(String),

    #[error("Invalid image data: {0}")]
    InvalidImage(String),

    #[error("Degenerate geometry: {0}")]
    Degenerate(String),

    #[error("No font loaded for text rendering")]
    FontMissing,

    #[error("Font error: {0}")]
    Font(String),
}

/// 渲染配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),

    #[error("Backend rejected config: {0}")]
    Convert(#[from] ConvertError),

    #[error("Font could not be loaded: {0}")]
    Font(#[from] RenderError),
}
