use crate::config::RenderConfig;
use crate::geometry::{ArcSegment, GeometrySpec, LabelRole};
use crate::Color;

pub use crate::geometry::Point;

const MIN_RADIUS_FACTOR: f64 = 0.40;
const MAX_RADIUS_FACTOR: f64 = 0.45;
const MIN_PIVOT_Y_FACTOR: f64 = 0.65;
const MAX_PIVOT_Y_FACTOR: f64 = 0.70;

// ============================================================================
// RETAINED MODE ABSTRACTIONS
// ============================================================================

/// Pixel-space shape primitives any vector backend can materialize.
/// Angles are screen radians, y grows downward.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Clear(Color),
    Arc {
        center: Point,
        inner_radius: f64,
        outer_radius: f64,
        start_angle: f64,
        end_angle: f64,
        color: Color,
    },
    Line {
        from: Point,
        to: Point,
        thickness: f32,
        tapered: bool,
        color: Color,
    },
    Circle {
        center: Point,
        radius: f64,
        color: Color,
    },
    /// Text centered on `anchor`.
    Text {
        anchor: Point,
        text: String,
        font_size: f32,
        color: Color,
    },
}

/// An ordered draw list; later primitives paint over earlier ones.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    primitives: Vec<Primitive>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}

/// Where the gauge ends up. Each call replaces what the surface showed.
pub trait DrawingSurface {
    fn present(&mut self, scene: Scene);
    fn show_message(&mut self, message: &str);
}

// ============================================================================
// LAYOUT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Pivot and outer radius of the gauge inside a viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub center: Point,
    pub radius: f64,
}

// ============================================================================
// RENDERER
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct GaugeRenderer {
    config: RenderConfig,
}

impl GaugeRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Centers the pivot horizontally and low enough to leave room for the
    /// sweep above it.
    pub fn layout(&self, viewport: Viewport) -> Layout {
        let radius_factor = self
            .config
            .radius_factor
            .clamp(MIN_RADIUS_FACTOR, MAX_RADIUS_FACTOR);
        let pivot_y_factor = self
            .config
            .pivot_y_factor
            .clamp(MIN_PIVOT_Y_FACTOR, MAX_PIVOT_Y_FACTOR);
        Layout {
            center: Point::new(viewport.width / 2.0, viewport.height * pivot_y_factor),
            radius: viewport.width.min(viewport.height).max(0.0) * radius_factor,
        }
    }

    /// Full redraw: the scene always starts by clearing the surface.
    pub fn render(&self, geometry: &GeometrySpec, viewport: Viewport) -> Scene {
        let config = &self.config;
        let mut scene = Scene::new();
        scene.add(Primitive::Clear(config.canvas_color));
        if viewport.is_empty() {
            return scene;
        }

        let Layout { center, radius } = self.layout(viewport);
        let px = |point: Point| point.to_pixels(center, radius);
        let size = |ratio: f64| (ratio * radius) as f32;
        let arc = |segment: &ArcSegment| Primitive::Arc {
            center,
            inner_radius: segment.inner_radius * radius,
            outer_radius: segment.outer_radius * radius,
            start_angle: segment.start_angle,
            end_angle: segment.end_angle,
            color: segment.color,
        };

        scene.add(arc(&geometry.background));
        for band in &geometry.bands {
            scene.add(arc(&band.arc));
        }
        if let Some(progress) = &geometry.progress {
            scene.add(arc(progress));
        }

        if let Some(target) = &geometry.target {
            scene.add(Primitive::Line {
                from: px(target.inner),
                to: px(target.outer),
                thickness: size(config.target_width_ratio),
                tapered: false,
                color: config.target_color,
            });
            scene.add(Primitive::Text {
                anchor: px(target.label.anchor),
                text: target.label.text.clone(),
                font_size: size(config.label_font_ratio),
                color: config.target_color,
            });
        }

        scene.add(Primitive::Line {
            from: center,
            to: px(geometry.needle.tip),
            thickness: size(config.needle_width_ratio),
            tapered: true,
            color: config.needle_color,
        });
        scene.add(Primitive::Circle {
            center,
            radius: config.hub_radius_ratio * radius,
            color: config.needle_color,
        });

        for label in &geometry.labels {
            let font_ratio = match label.role {
                LabelRole::Value => config.value_font_ratio,
                _ => config.label_font_ratio,
            };
            scene.add(Primitive::Text {
                anchor: px(label.anchor),
                text: label.text.clone(),
                font_size: size(font_ratio),
                color: config.text_color,
            });
        }

        scene
    }
}
