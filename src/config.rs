use std::path::{Path, PathBuf};

use bon::Builder;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::{Domain, DomainPolicy};
use crate::format::NumberFormat;
use crate::Color;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid color band #{index}: {reason}")]
    InvalidBand { index: usize, reason: String },
    #[error("start and end angle must differ (both {0}°)")]
    DegenerateSweep(f64),
    #[error("{name} must be within {min}..={max}, got {value}")]
    RatioOutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("failed to read font {}: {source}", path.display())]
    FontRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{} is not a usable TrueType/OpenType font", .0.display())]
    InvalidFont(PathBuf),
}

// ============================================================================
// GAUGE CONFIGURATION
// ============================================================================

/// Which way configured angles are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AngleConvention {
    /// 0° points at 3 o'clock and angles grow clockwise on a y-down screen;
    /// the upper semicircle is -180°..0°.
    #[default]
    Screen,
    /// 0° points at 12 o'clock and angles grow clockwise; the upper
    /// semicircle is -90°..90°.
    Clock,
}

impl AngleConvention {
    /// Converts a configured angle in degrees to screen radians.
    pub fn to_screen_radians(self, degrees: f64) -> f64 {
        match self {
            AngleConvention::Screen => degrees.to_radians(),
            AngleConvention::Clock => (degrees - 90.0).to_radians(),
        }
    }
}

/// A colored zone of the domain, e.g. red/amber/green.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ColorBand {
    pub from: f64,
    pub to: f64,
    pub color: Color,
}

impl ColorBand {
    pub const fn new(from: f64, to: f64, color: Color) -> Self {
        Self { from, to, color }
    }
}

fn default_color_bands() -> Vec<ColorBand> {
    vec![
        ColorBand::new(0.0, 33.0, Color::new(0xef, 0x53, 0x50)),
        ColorBand::new(33.0, 66.0, Color::new(0xff, 0xb7, 0x4d)),
        ColorBand::new(66.0, 100.0, Color::new(0x66, 0xbb, 0x6a)),
    ]
}

#[derive(Debug, Clone, PartialEq, Builder, Deserialize)]
#[serde(default)]
pub struct GaugeConfig {
    // Domain, overwritten by every successful load
    #[builder(default = 0.0)]
    pub min_value: f64,
    #[builder(default = 100.0)]
    pub max_value: f64,

    // Sweep, in degrees
    #[builder(default = -180.0)]
    pub start_angle: f64,
    #[builder(default = 0.0)]
    pub end_angle: f64,
    #[builder(default)]
    pub angle_convention: AngleConvention,

    #[builder(default = default_color_bands())]
    pub color_bands: Vec<ColorBand>,

    // Proportions relative to the outer radius
    #[builder(default = 0.6)]
    pub inner_radius_ratio: f64,
    #[builder(default = 0.65)]
    pub needle_length_ratio: f64,

    #[builder(default = Color::new(0xf0, 0xf0, 0xf0))]
    pub background_color: Color,
    /// Fills the sweep from the start up to the current value when set.
    pub progress_color: Option<Color>,
}

impl Default for GaugeConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl GaugeConfig {
    pub fn domain(&self) -> Domain {
        Domain::new(self.min_value, self.max_value)
    }

    pub fn apply_domain(&mut self, domain: Domain) {
        self.min_value = domain.min();
        self.max_value = domain.max();
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.start_angle.is_finite()
            || !self.end_angle.is_finite()
            || self.start_angle == self.end_angle
        {
            return Err(SettingsError::DegenerateSweep(self.start_angle));
        }
        check_ratio("inner_radius_ratio", self.inner_radius_ratio, 0.0, 0.95)?;
        check_ratio("needle_length_ratio", self.needle_length_ratio, 0.1, 1.0)?;

        let mut previous: Option<&ColorBand> = None;
        for (index, band) in self.color_bands.iter().enumerate() {
            let invalid = |reason: String| SettingsError::InvalidBand { index, reason };
            if !band.from.is_finite() || !band.to.is_finite() {
                return Err(invalid("bounds must be finite".to_string()));
            }
            if band.from >= band.to {
                return Err(invalid(format!("from {} is not below to {}", band.from, band.to)));
            }
            if let Some(prev) = previous {
                if band.from < prev.to {
                    return Err(invalid(format!(
                        "starts at {} before the previous band ends at {}",
                        band.from, prev.to
                    )));
                }
            }
            previous = Some(band);
        }
        Ok(())
    }
}

fn check_ratio(name: &'static str, value: f64, min: f64, max: f64) -> Result<(), SettingsError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(SettingsError::RatioOutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}

// ============================================================================
// RENDER CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Builder, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    // Layout, clamped to 0.40..=0.45 and 0.65..=0.70 by the renderer
    #[builder(default = 0.45)]
    pub radius_factor: f64,
    #[builder(default = 0.7)]
    pub pivot_y_factor: f64,

    // Sizes relative to the outer radius
    #[builder(default = 0.03)]
    pub needle_width_ratio: f64,
    #[builder(default = 0.05)]
    pub hub_radius_ratio: f64,
    #[builder(default = 0.015)]
    pub target_width_ratio: f64,
    #[builder(default = 0.12)]
    pub label_font_ratio: f64,
    #[builder(default = 0.2)]
    pub value_font_ratio: f64,

    // Colors
    #[builder(default = Color::new(0xff, 0xff, 0xff))]
    pub canvas_color: Color,
    #[builder(default = Color::new(0x33, 0x33, 0x33))]
    pub needle_color: Color,
    #[builder(default = Color::new(0x21, 0x21, 0x21))]
    pub target_color: Color,
    #[builder(default = Color::new(0x33, 0x33, 0x33))]
    pub text_color: Color,
    #[builder(default = Color::new(0xc6, 0x28, 0x28))]
    pub error_color: Color,

    /// TrueType/OpenType font used by the raster backend for text.
    pub font_path: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

// ============================================================================
// SETTINGS FILE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct DomainSettings {
    pub policy: DomainPolicy,
    /// Scale reference for the fixed-target policy when no target column exists.
    pub fallback_target: f64,
}

impl Default for DomainSettings {
    fn default() -> Self {
        Self {
            policy: DomainPolicy::default(),
            fallback_target: 100.0,
        }
    }
}

/// Everything the settings surface can change.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct GaugeSettings {
    pub gauge: GaugeConfig,
    pub domain: DomainSettings,
    pub number_format: NumberFormat,
    pub render: RenderConfig,
}

impl GaugeSettings {
    /// Reads a settings file; `GAUGE__SECTION__KEY` environment variables
    /// override individual keys.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let settings: GaugeSettings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("GAUGE").separator("__"))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        tracing::info!(
            path = %path.display(),
            policy = ?settings.domain.policy,
            bands = settings.gauge.color_bands.len(),
            "loaded gauge settings"
        );
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.gauge.validate()?;
        if !self.domain.fallback_target.is_finite() {
            return Err(SettingsError::RatioOutOfRange {
                name: "fallback_target",
                value: self.domain.fallback_target,
                min: f64::MIN,
                max: f64::MAX,
            });
        }
        Ok(())
    }
}
