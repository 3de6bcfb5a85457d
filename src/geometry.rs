//! Data-to-geometry mapping for the gauge.
//!
//! Everything here lives in angle/radius space: angles are screen radians
//! (y grows downward) and radii are fractions of the outer radius.

use crate::config::{AngleConvention, GaugeConfig};
use crate::data::GaugeState;
use crate::domain::Domain;
use crate::format::{format_number, NumberFormat};
use crate::Color;

/// The target tick runs from just inside the bands to just past the rim.
pub const TARGET_TICK_INSET: f64 = 0.05;
pub const TARGET_TICK_OVERSHOOT: f64 = 0.05;

const BOUND_LABEL_RADIUS: f64 = 1.12;
const TARGET_LABEL_RADIUS: f64 = 1.2;
const VALUE_LABEL_RADIUS: f64 = 1.3;

// ============================================================================
// GEOMETRY TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn polar(angle: f64, radius: f64) -> Self {
        Self {
            x: angle.cos() * radius,
            y: angle.sin() * radius,
        }
    }

    /// Maps a unit-space point into pixels around `center`.
    pub fn to_pixels(self, center: Point, radius: f64) -> Point {
        Point {
            x: center.x + self.x * radius,
            y: center.y + self.y * radius,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcSegment {
    /// Screen radians, in sweep order (`start_angle` maps the lower value).
    pub start_angle: f64,
    pub end_angle: f64,
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub color: Color,
}

/// A color band clipped to the domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandSegment {
    pub from: f64,
    pub to: f64,
    pub arc: ArcSegment,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeedleSpec {
    pub angle: f64,
    pub length: f64,
    pub tip: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelRole {
    Min,
    Max,
    Value,
    Target,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub role: LabelRole,
    pub anchor: Point,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetMarker {
    pub value: f64,
    pub angle: f64,
    pub inner: Point,
    pub outer: Point,
    pub label: Label,
}

/// Fully resolved drawing description of one gauge frame.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometrySpec {
    pub domain: Domain,
    pub background: ArcSegment,
    pub progress: Option<ArcSegment>,
    pub bands: Vec<BandSegment>,
    pub needle: NeedleSpec,
    pub target: Option<TargetMarker>,
    /// Min, max and current value labels, in that order.
    pub labels: Vec<Label>,
}

// ============================================================================
// ANGLE MAPPING
// ============================================================================

/// Clamped linear map from the domain onto the configured sweep.
#[derive(Debug, Clone, Copy)]
pub struct AngleScale {
    domain: Domain,
    start_degrees: f64,
    end_degrees: f64,
    convention: AngleConvention,
}

impl AngleScale {
    pub fn new(config: &GaugeConfig, domain: Domain) -> Self {
        Self {
            domain,
            start_degrees: config.start_angle,
            end_degrees: config.end_angle,
            convention: config.angle_convention,
        }
    }

    /// Configured angle of `value` in degrees, clamped to the sweep.
    pub fn degrees(&self, value: f64) -> f64 {
        let t = self.domain.normalize(value);
        self.start_degrees + t * (self.end_degrees - self.start_degrees)
    }

    /// Screen angle of `value` in radians, clamped to the sweep.
    pub fn radians(&self, value: f64) -> f64 {
        self.convention.to_screen_radians(self.degrees(value))
    }

    pub fn start(&self) -> f64 {
        self.convention.to_screen_radians(self.start_degrees)
    }

    pub fn end(&self) -> f64 {
        self.convention.to_screen_radians(self.end_degrees)
    }

    pub fn midpoint(&self) -> f64 {
        (self.start() + self.end()) / 2.0
    }
}

// ============================================================================
// BUILDER
// ============================================================================

pub fn build_geometry(
    config: &GaugeConfig,
    state: &GaugeState,
    number_format: NumberFormat,
) -> GeometrySpec {
    let domain = config.domain();
    let scale = AngleScale::new(config, domain);
    let inner = config.inner_radius_ratio;
    let arc = |start_angle: f64, end_angle: f64, color: Color| ArcSegment {
        start_angle,
        end_angle,
        inner_radius: inner,
        outer_radius: 1.0,
        color,
    };

    let background = arc(scale.start(), scale.end(), config.background_color);

    let needle_angle = scale.radians(state.current_value);
    let needle = NeedleSpec {
        angle: needle_angle,
        length: config.needle_length_ratio,
        tip: Point::polar(needle_angle, config.needle_length_ratio),
    };

    let progress = config
        .progress_color
        .map(|color| arc(scale.start(), needle_angle, color));

    let bands = config
        .color_bands
        .iter()
        .filter_map(|band| {
            let from = band.from.max(domain.min());
            let to = band.to.min(domain.max());
            (to > from).then(|| BandSegment {
                from,
                to,
                arc: arc(scale.radians(from), scale.radians(to), band.color),
            })
        })
        .collect();

    let target = state
        .target_value
        .filter(|value| domain.contains(*value))
        .map(|value| {
            let angle = scale.radians(value);
            TargetMarker {
                value,
                angle,
                inner: Point::polar(angle, inner - TARGET_TICK_INSET),
                outer: Point::polar(angle, 1.0 + TARGET_TICK_OVERSHOOT),
                label: Label {
                    role: LabelRole::Target,
                    anchor: Point::polar(angle, TARGET_LABEL_RADIUS),
                    text: format_number(value, number_format),
                },
            }
        });

    let labels = vec![
        Label {
            role: LabelRole::Min,
            anchor: Point::polar(scale.start(), BOUND_LABEL_RADIUS),
            text: format_number(domain.min(), number_format),
        },
        Label {
            role: LabelRole::Max,
            anchor: Point::polar(scale.end(), BOUND_LABEL_RADIUS),
            text: format_number(domain.max(), number_format),
        },
        Label {
            role: LabelRole::Value,
            anchor: Point::polar(scale.midpoint(), VALUE_LABEL_RADIUS),
            text: format_number(state.current_value, number_format),
        },
    ];

    GeometrySpec {
        domain,
        background,
        progress,
        bands,
        needle,
        target,
        labels,
    }
}
