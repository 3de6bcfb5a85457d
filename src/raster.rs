//! Software rasterizer for [`Scene`]s into RGBA8 frame buffers, as used by
//! `pixels`.

use std::f64::consts::TAU;
use std::path::Path;

use rusttype::{point, Font, PositionedGlyph, Scale};

use crate::config::{RenderConfig, SettingsError};
use crate::render::{DrawingSurface, Point, Primitive, Scene};
use crate::Color;

/// Fraction of the shorter viewport side used for message text.
const MESSAGE_FONT_RATIO: f64 = 0.06;
/// Fallback for fontless messages: a centered bar this fraction of the width.
const ERROR_BAR_WIDTH_RATIO: f64 = 0.4;

// ============================================================================
// SURFACE
// ============================================================================

/// What a [`RasterSurface`] currently shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SurfaceContent {
    #[default]
    Blank,
    Scene(Scene),
    Message(String),
}

/// Keeps the latest presented content until the window paints it.
#[derive(Debug, Default)]
pub struct RasterSurface {
    content: SurfaceContent,
    revision: u64,
}

impl RasterSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &SurfaceContent {
        &self.content
    }

    /// Bumped on every present or message; lets the window skip repaints.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn paint(&self, rasterizer: &Rasterizer, frame: &mut [u8], width: usize, height: usize) {
        match &self.content {
            SurfaceContent::Blank => rasterizer.clear(frame, width, height),
            SurfaceContent::Scene(scene) => rasterizer.rasterize(scene, frame, width, height),
            SurfaceContent::Message(message) => {
                rasterizer.rasterize_message(message, frame, width, height)
            }
        }
    }
}

impl DrawingSurface for RasterSurface {
    fn present(&mut self, scene: Scene) {
        self.content = SurfaceContent::Scene(scene);
        self.revision += 1;
    }

    fn show_message(&mut self, message: &str) {
        self.content = SurfaceContent::Message(message.to_string());
        self.revision += 1;
    }
}

// ============================================================================
// RASTERIZER
// ============================================================================

pub struct Rasterizer {
    font: Option<Font<'static>>,
    canvas_color: Color,
    message_color: Color,
}

impl Rasterizer {
    /// A rasterizer without a font skips text primitives.
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            font: None,
            canvas_color: config.canvas_color,
            message_color: config.error_color,
        }
    }

    pub fn with_font(mut self, font: Font<'static>) -> Self {
        self.font = Some(font);
        self
    }

    /// Builds a rasterizer, loading the configured font if there is one.
    pub fn from_config(config: &RenderConfig) -> Result<Self, SettingsError> {
        let rasterizer = Self::new(config);
        match &config.font_path {
            Some(path) => Ok(rasterizer.with_font(load_font(path)?)),
            None => {
                tracing::warn!("no font configured, gauge text will not be drawn");
                Ok(rasterizer)
            }
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn clear(&self, frame: &mut [u8], width: usize, height: usize) {
        if let Some(mut canvas) = Canvas::new(frame, width, height) {
            canvas.clear(self.canvas_color);
        }
    }

    pub fn rasterize(&self, scene: &Scene, frame: &mut [u8], width: usize, height: usize) {
        let Some(mut canvas) = Canvas::new(frame, width, height) else {
            return;
        };
        for primitive in scene.primitives() {
            match primitive {
                Primitive::Clear(color) => canvas.clear(*color),
                Primitive::Arc {
                    center,
                    inner_radius,
                    outer_radius,
                    start_angle,
                    end_angle,
                    color,
                } => fill_arc(
                    &mut canvas,
                    *center,
                    *inner_radius,
                    *outer_radius,
                    *start_angle,
                    *end_angle,
                    *color,
                ),
                Primitive::Line {
                    from,
                    to,
                    thickness,
                    tapered,
                    color,
                } => draw_thick_line_aa(&mut canvas, *from, *to, *thickness, *tapered, *color),
                Primitive::Circle {
                    center,
                    radius,
                    color,
                } => draw_circle(&mut canvas, *center, *radius, *color),
                Primitive::Text {
                    anchor,
                    text,
                    font_size,
                    color,
                } => {
                    if let Some(font) = &self.font {
                        draw_text(&mut canvas, *anchor, text, font, Scale::uniform(*font_size), *color);
                    }
                }
            }
        }
    }

    /// Replaces the frame with `message` centered on the canvas.
    pub fn rasterize_message(&self, message: &str, frame: &mut [u8], width: usize, height: usize) {
        let Some(mut canvas) = Canvas::new(frame, width, height) else {
            return;
        };
        canvas.clear(self.canvas_color);
        let Some(font) = &self.font else {
            tracing::warn!(%message, "no font, drawing an error bar instead of the message");
            draw_error_bar(&mut canvas, self.message_color);
            return;
        };
        let size = (width.min(height) as f64 * MESSAGE_FONT_RATIO).max(12.0) as f32;
        let anchor = Point::new(width as f64 / 2.0, height as f64 / 2.0);
        draw_text(&mut canvas, anchor, message, font, Scale::uniform(size), self.message_color);
    }
}

pub fn load_font(path: &Path) -> Result<Font<'static>, SettingsError> {
    let bytes = std::fs::read(path).map_err(|source| SettingsError::FontRead {
        path: path.to_path_buf(),
        source,
    })?;
    Font::try_from_vec(bytes).ok_or_else(|| SettingsError::InvalidFont(path.to_path_buf()))
}

// ============================================================================
// CORE DATA TYPES
// ============================================================================

struct Canvas<'a> {
    frame: &'a mut [u8],
    width: usize,
    height: usize,
}

impl<'a> Canvas<'a> {
    fn new(frame: &'a mut [u8], width: usize, height: usize) -> Option<Self> {
        if frame.len() < width * height * 4 {
            tracing::warn!(
                len = frame.len(),
                width,
                height,
                "frame buffer smaller than viewport, skipping paint"
            );
            return None;
        }
        Some(Self {
            frame,
            width,
            height,
        })
    }

    fn clear(&mut self, color: Color) {
        for chunk in self.frame[..self.width * self.height * 4].chunks_exact_mut(4) {
            chunk.copy_from_slice(&[color.r, color.g, color.b, 0xff]);
        }
    }

    fn set_pixel(&mut self, x: i64, y: i64, color: Color, alpha: f32) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = (y as usize * self.width + x as usize) * 4;
        let a = alpha.clamp(0.0, 1.0);
        let src = [color.r as f32, color.g as f32, color.b as f32];
        for (channel, value) in src.iter().enumerate() {
            let dst = self.frame[idx + channel] as f32;
            self.frame[idx + channel] = (value * a + dst * (1.0 - a)).round() as u8;
        }
        self.frame[idx + 3] = 0xff;
    }

    /// Pixel rows/columns covering `[center - reach, center + reach]`.
    fn bounds(&self, center: Point, reach: f64) -> (i64, i64, i64, i64) {
        (
            ((center.x - reach).floor() as i64).max(0),
            ((center.x + reach).ceil() as i64).min(self.width as i64 - 1),
            ((center.y - reach).floor() as i64).max(0),
            ((center.y + reach).ceil() as i64).min(self.height as i64 - 1),
        )
    }
}

// ============================================================================
// DRAWING PRIMITIVES
// ============================================================================

fn fill_arc(
    canvas: &mut Canvas,
    center: Point,
    inner_radius: f64,
    outer_radius: f64,
    start_angle: f64,
    end_angle: f64,
    color: Color,
) {
    let (lo, hi) = if start_angle <= end_angle {
        (start_angle, end_angle)
    } else {
        (end_angle, start_angle)
    };
    let span = hi - lo;
    if span <= 0.0 || outer_radius <= 0.0 {
        return;
    }
    let (min_x, max_x, min_y, max_y) = canvas.bounds(center, outer_radius + 1.0);
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = x as f64 - center.x;
            let dy = y as f64 - center.y;
            let angle = dy.atan2(dx);
            if span < TAU && (angle - lo).rem_euclid(TAU) > span {
                continue;
            }
            let dist = dx.hypot(dy);
            // Soften one pixel on either rim
            let aa = if dist > outer_radius {
                1.0 - (dist - outer_radius).min(1.0)
            } else if dist < inner_radius {
                1.0 - (inner_radius - dist).min(1.0)
            } else {
                1.0
            };
            if aa > 0.0 {
                canvas.set_pixel(x, y, color, aa as f32);
            }
        }
    }
}

/// Anti-aliased segment; a tapered line narrows towards `to`.
fn draw_thick_line_aa(
    canvas: &mut Canvas,
    from: Point,
    to: Point,
    thickness: f32,
    tapered: bool,
    color: Color,
) {
    let thickness = thickness as f64;
    let (min_x, max_x, min_y, max_y) = {
        let reach = thickness + 1.0;
        let lo = Point::new(from.x.min(to.x), from.y.min(to.y));
        let hi = Point::new(from.x.max(to.x), from.y.max(to.y));
        let (a, _, c, _) = canvas.bounds(lo, reach);
        let (_, b, _, d) = canvas.bounds(hi, reach);
        (a, b, c, d)
    };
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let len_sq = dx * dx + dy * dy;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let px = x as f64 - from.x;
            let py = y as f64 - from.y;
            let t = if len_sq > 0.0 {
                ((px * dx + py * dy) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let lx = from.x + t * dx;
            let ly = from.y + t * dy;
            let dist = (lx - x as f64).hypot(ly - y as f64);
            let local_thickness = if tapered {
                // keep 5% at the tip so it does not vanish
                thickness * (1.0 - t * 0.95)
            } else {
                thickness
            };
            let aa = (1.0 - (dist - local_thickness / 2.0).clamp(0.0, 1.0)).clamp(0.0, 1.0);
            if aa > 0.01 {
                canvas.set_pixel(x, y, color, aa as f32);
            }
        }
    }
}

fn draw_circle(canvas: &mut Canvas, center: Point, radius: f64, color: Color) {
    let (min_x, max_x, min_y, max_y) = canvas.bounds(center, radius + 1.0);
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dist = (x as f64 - center.x).hypot(y as f64 - center.y);
            let aa = if dist > radius {
                1.0 - (dist - radius).min(1.0)
            } else {
                1.0
            };
            if aa > 0.0 {
                canvas.set_pixel(x, y, color, aa as f32);
            }
        }
    }
}

/// Draws `text` centered on `anchor`.
fn draw_text(
    canvas: &mut Canvas,
    anchor: Point,
    text: &str,
    font: &Font,
    scale: Scale,
    color: Color,
) {
    let v_metrics = font.v_metrics(scale);
    let glyphs: Vec<PositionedGlyph> = font
        .layout(text, scale, point(0.0, v_metrics.ascent))
        .collect();

    // Bounding box for the whole string
    let (min_x, max_x, min_y, max_y) = glyphs.iter().filter_map(|g| g.pixel_bounding_box()).fold(
        (i32::MAX, i32::MIN, i32::MAX, i32::MIN),
        |(min_x, max_x, min_y, max_y), bb| {
            (
                min_x.min(bb.min.x),
                max_x.max(bb.max.x),
                min_y.min(bb.min.y),
                max_y.max(bb.max.y),
            )
        },
    );
    if min_x >= max_x || min_y >= max_y {
        return;
    }
    let offset_x = anchor.x.round() as i64 - ((max_x - min_x) / 2) as i64;
    let offset_y = anchor.y.round() as i64 - ((max_y - min_y) / 2) as i64;
    for glyph in &glyphs {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, v| {
                let px = offset_x + gx as i64 + (bb.min.x - min_x) as i64;
                let py = offset_y + gy as i64 + (bb.min.y - min_y) as i64;
                canvas.set_pixel(px, py, color, v);
            });
        }
    }
}

fn draw_error_bar(canvas: &mut Canvas, color: Color) {
    let bar_width = (canvas.width as f64 * ERROR_BAR_WIDTH_RATIO).round() as i64;
    let bar_height = (canvas.height as i64 / 40).max(2);
    let left = (canvas.width as i64 - bar_width) / 2;
    let top = (canvas.height as i64 - bar_height) / 2;
    for y in top..top + bar_height {
        for x in left..left + bar_width {
            canvas.set_pixel(x, y, color, 1.0);
        }
    }
}
