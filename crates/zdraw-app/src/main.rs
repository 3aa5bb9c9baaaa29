//! ZDraw 演示程序
//!
//! 构建一组示例图形，经所有后端转换，输出 SVG 与 PNG，并做一次碰撞检测。
//!
//! 用法：`zdraw [config.json] [输出目录]`，或 `zdraw --print-config` 打印默认配置。

use anyhow::{Context, Result};
use std::f64::consts::PI;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use zdraw_core::prelude::*;
use zdraw_renderer::convert::{text_element, PathConverter};
use zdraw_renderer::{convert_batch, new_pixmap, RenderConfig, RenderError, ShapeRenderer};

/// 画布尺寸（像素）
const CANVAS_WIDTH: u32 = 640;
const CANVAS_HEIGHT: u32 = 400;

fn main() -> Result<()> {
    // 初始化日志
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder().with_max_level(Level::INFO).finish(),
    )?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("--print-config") {
        println!("{}", RenderConfig::default().to_json()?);
        return Ok(());
    }

    let config = match args.first() {
        Some(path) => load_config(Path::new(path))?,
        None => RenderConfig::default(),
    };
    let out_dir = PathBuf::from(args.get(1).map(String::as_str).unwrap_or("."));

    info!("Starting ZDraw demo...");

    let shapes = create_demo_content()?;
    info!(count = shapes.len(), "demo shapes created");

    convert_all_backends(&config, &shapes)?;
    write_svg(&config, &shapes, &out_dir.join("zdraw-demo.svg"))?;
    render_png(&config, &shapes, &out_dir.join("zdraw-demo.png"))?;
    check_collisions(&config, &shapes)?;

    Ok(())
}

fn load_config(path: &Path) -> Result<RenderConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = RenderConfig::from_json(&json)
        .with_context(|| format!("invalid config {}", path.display()))?;
    info!(path = %path.display(), "loaded render config");
    Ok(config)
}

fn create_demo_content() -> Result<Vec<Shape>> {
    let mut shapes = Vec::new();

    // 网格上的点
    for i in 0..5 {
        let x = 40.0 + i as f64 * 20.0;
        shapes.push(Shape::Point(PointShape::new(Point2::new(x, 30.0))));
    }

    shapes.push(Shape::Line(
        LineShape::new(Point2::new(40.0, 60.0), Point2::new(200.0, 60.0))
            .with_style(ShapeStyle::stroked(Color::GRAY, 2.0).with_dash(vec![6.0, 3.0], 0.0)),
    ));

    shapes.push(Shape::Rectangle(
        RectangleShape::new(Point2::new(40.0, 90.0), Point2::new(160.0, 170.0))
            .with_style(ShapeStyle::stroked(Color::BLACK, 1.5).with_fill(Color::rgba(0, 160, 220, 160))),
    ));

    shapes.push(Shape::Ellipse(
        EllipseShape::new(Point2::new(130.0, 130.0), Point2::new(250.0, 200.0))
            .with_style(ShapeStyle::stroked(Color::new(200, 60, 0), 2.0).with_fill(Color::rgba(255, 200, 0, 140))),
    ));

    shapes.push(Shape::Arc(
        ArcShape::new(Point2::new(340.0, 120.0), PathSize::new(60.0, 40.0), 0.0, 1.5 * PI)
            .with_style(ShapeStyle::stroked(Color::MAGENTA, 3.0)),
    ));

    shapes.push(Shape::CubicBezier(CubicBezierShape::new(
        Point2::new(420.0, 60.0),
        Point2::new(480.0, 0.0),
        Point2::new(540.0, 160.0),
        Point2::new(600.0, 80.0),
    )));

    shapes.push(Shape::QuadraticBezier(
        QuadraticBezierShape::new(Point2::new(420.0, 200.0), Point2::new(510.0, 120.0), Point2::new(600.0, 200.0))
            .with_style(ShapeStyle::stroked(Color::BLUE, 2.0)),
    ));

    // 带洞的星形，演示填充规则
    let mut builder = PathBuilder::new(FillRule::EvenOdd);
    let center = Point2::new(120.0, 300.0);
    let star: Vec<Point2> = (0..5)
        .map(|i| {
            let angle = -PI / 2.0 + i as f64 * 4.0 * PI / 5.0;
            center + Vector2::new(angle.cos(), angle.sin()) * 70.0
        })
        .collect();
    builder.begin_figure_default(star[0]);
    builder.poly_line_to(star[1..].to_vec())?;
    builder.begin_figure(Point2::new(220.0, 260.0), true, true);
    builder.line_to(Point2::new(300.0, 260.0))?;
    builder.arc_to(
        Point2::new(300.0, 340.0),
        PathSize::new(40.0, 40.0),
        0.0,
        false,
        SweepDirection::Clockwise,
    )?;
    builder.quadratic_bezier_to(Point2::new(260.0, 380.0), Point2::new(220.0, 340.0))?;
    shapes.push(Shape::Path(
        PathShape::new(builder.finish())
            .with_style(ShapeStyle::stroked(Color::BLACK, 1.0).with_fill(Color::new(120, 200, 120))),
    ));

    shapes.push(Shape::Text(TextShape::new(Point2::new(360.0, 300.0), "ZDraw", 24.0)));

    Ok(shapes)
}

/// 曲线类图形的路径几何
fn shape_geometry(shape: &Shape) -> Option<PathGeometry> {
    match shape {
        Shape::Line(s) => Some(s.to_geometry()),
        Shape::Rectangle(s) => Some(s.to_geometry()),
        Shape::Ellipse(s) => Some(s.to_geometry()),
        Shape::Arc(s) => Some(s.to_geometry()),
        Shape::CubicBezier(s) => Some(s.to_geometry()),
        Shape::QuadraticBezier(s) => Some(s.to_geometry()),
        Shape::Path(s) => Some(s.geometry.clone()),
        Shape::Point(_) | Shape::Text(_) | Shape::Image(_) => None,
    }
}

fn report<C: PathConverter>(converter: &C, geometries: &[PathGeometry]) {
    let results = convert_batch(converter, geometries);
    let failed = results.iter().filter(|r| r.is_err()).count();
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        warn!(backend = converter.name(), "conversion failed: {}", err);
    }
    info!(
        backend = converter.name(),
        policy = ?converter.arc_policy(),
        converted = results.len() - failed,
        failed,
        "backend conversion finished"
    );
}

fn convert_all_backends(config: &RenderConfig, shapes: &[Shape]) -> Result<()> {
    let geometries: Vec<PathGeometry> = shapes.iter().filter_map(shape_geometry).collect();

    report(&config.svg_converter()?, &geometries);
    report(&config.lyon_converter()?, &geometries);
    report(&config.skia_converter()?, &geometries);
    report(&config.pdf_converter()?, &geometries);
    Ok(())
}

fn write_svg(config: &RenderConfig, shapes: &[Shape], path: &Path) -> Result<()> {
    let converter = config.svg_converter()?;
    let state = config.renderer_state();

    let mut document = String::new();
    writeln!(
        document,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
        CANVAS_WIDTH, CANVAS_HEIGHT, CANVAS_WIDTH, CANVAS_HEIGHT
    )?;
    writeln!(
        document,
        r#"<rect width="100%" height="100%" fill="{}"/>"#,
        config.background.to_hex()
    )?;

    for shape in shapes {
        let style = shape.style().unwrap_or_else(|| state.fallback_style(shape));
        if let Shape::Text(text) = shape {
            writeln!(document, "{}", text_element(text, style))?;
            continue;
        }
        let Some(geometry) = shape_geometry(shape) else {
            continue;
        };
        match converter.convert(&geometry) {
            Ok(svg) => writeln!(document, "{}", svg.to_element(style))?,
            Err(err) => warn!(shape = shape.type_name(), "skipped in svg output: {}", err),
        }
    }
    document.push_str("</svg>\n");

    std::fs::write(path, document).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "svg written");
    Ok(())
}

fn render_png(config: &RenderConfig, shapes: &[Shape], path: &Path) -> Result<()> {
    let mut pixmap = new_pixmap(CANVAS_WIDTH, CANVAS_HEIGHT)?;
    let mut renderer = config.skia_renderer()?;
    let canvas = BoundingBox2::new(
        Point2::origin(),
        Point2::new(CANVAS_WIDTH as f64, CANVAS_HEIGHT as f64),
    );

    renderer.fill(&mut pixmap, &canvas, config.background)?;
    if config.show_grid {
        renderer.grid(&mut pixmap, &config.grid, &canvas)?;
    }

    for shape in shapes {
        match renderer.draw_shape(&mut pixmap, shape, None) {
            Ok(()) => {}
            Err(RenderError::FontMissing) => {
                warn!(shape = shape.type_name(), "no font loaded, text skipped")
            }
            Err(err) => return Err(err.into()),
        }
    }

    pixmap
        .save_png(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "png written");
    Ok(())
}

fn check_collisions(config: &RenderConfig, shapes: &[Shape]) -> Result<()> {
    let rectangle = shapes.iter().find(|s| matches!(s, Shape::Rectangle(_)));
    let ellipse = shapes.iter().find(|s| matches!(s, Shape::Ellipse(_)));
    let (Some(rectangle), Some(ellipse)) = (rectangle, ellipse) else {
        return Ok(());
    };

    // 按子路径逐对检测，各子路径单独是凸的
    for a in rectangle.outlines(config.flatten_tolerance) {
        for b in ellipse.outlines(config.flatten_tolerance) {
            let overlapping = sat::overlap(&a, &b)?;
            info!(overlapping, "rectangle vs ellipse");

            let mtv = sat::minimum_translation_vector_with_containment(&a, &b)?;
            if let Some(unit) = mtv.and_then(|mtv| mtv.normalized()) {
                let push = unit.axis * unit.overlap;
                info!(dx = push.x, dy = push.y, depth = unit.overlap, "minimum translation vector");
            }
        }
    }
    Ok(())
}
