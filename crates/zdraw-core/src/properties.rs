//! 视觉属性：颜色与图形样式

use serde::{Deserialize, Serialize};

/// RGBA 颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const RED: Color = Color::new(255, 0, 0);
    pub const GREEN: Color = Color::new(0, 255, 0);
    pub const BLUE: Color = Color::new(0, 0, 255);
    pub const YELLOW: Color = Color::new(255, 255, 0);
    pub const CYAN: Color = Color::new(0, 255, 255);
    pub const MAGENTA: Color = Color::new(255, 0, 255);
    pub const GRAY: Color = Color::new(128, 128, 128);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// `#rrggbb` 形式（不含透明度）
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn opacity(&self) -> f64 {
        self.a as f64 / 255.0
    }
}

/// 图形样式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    pub stroke: Color,
    /// 线宽（世界坐标单位）
    pub stroke_width: f64,
    /// 虚线模式，空表示实线
    #[serde(default)]
    pub dash_pattern: Vec<f64>,
    #[serde(default)]
    pub dash_offset: f64,
    pub fill: Color,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            stroke: Color::BLACK,
            stroke_width: 1.0,
            dash_pattern: Vec::new(),
            dash_offset: 0.0,
            fill: Color::TRANSPARENT,
        }
    }
}

impl ShapeStyle {
    pub fn stroked(stroke: Color, stroke_width: f64) -> Self {
        Self {
            stroke,
            stroke_width,
            ..Default::default()
        }
    }

    /// 文本颜色：填充色，填充透明时取描边色
    pub fn text_color(&self) -> Color {
        if self.fill.is_transparent() {
            self.stroke
        } else {
            self.fill
        }
    }

    pub fn with_fill(mut self, fill: Color) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_dash(mut self, pattern: Vec<f64>, offset: f64) -> Self {
        self.dash_pattern = pattern;
        self.dash_offset = offset;
        self
    }

    pub fn is_dashed(&self) -> bool {
        !self.dash_pattern.is_empty()
    }
}
