//! 几何内核错误定义

use thiserror::Error;

/// 路径构建错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("No open figure: call begin_figure before appending segments")]
    NoOpenFigure,

    #[error("Invalid point count for {kind}: got {count}, expected a positive multiple of {multiple}")]
    InvalidPointCount {
        kind: &'static str,
        count: usize,
        multiple: usize,
    },

    #[error("Figure index out of range: {0}")]
    FigureOutOfRange(usize),

    #[error("Segment index out of range: figure {figure}, segment {segment}")]
    SegmentOutOfRange { figure: usize, segment: usize },
}

/// SAT 碰撞检测错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SatError {
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),
}
