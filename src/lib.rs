// ============================================================================
// CRATE CONFIGURATION & IMPORTS
// ============================================================================

pub mod bridge;
pub mod columns;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod format;
pub mod geometry;
pub mod host;
pub mod raster;
pub mod render;

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

pub use bridge::{ActiveFlag, DataBridge, ViewState};
pub use columns::{resolve_columns, ResolvedColumns};
pub use config::{
    AngleConvention, ColorBand, DomainSettings, GaugeConfig, GaugeSettings, RenderConfig,
    SettingsError,
};
pub use data::{CellValue, ColumnDescriptor, DataCell, DataRow, DataTable, DataType, GaugeState};
pub use domain::{compute_domain, Domain, DomainPolicy};
pub use error::GaugeError;
pub use format::{format_number, NumberFormat};
pub use geometry::{build_geometry, GeometrySpec};
pub use host::{
    HostEventKind, HostRuntime, ListenerId, ListenerRegistry, SettingsDialog, Trigger,
    TriggerReceiver, TriggerSender,
};
pub use raster::{RasterSurface, Rasterizer};
pub use render::{DrawingSurface, GaugeRenderer, Point, Primitive, Scene, Viewport};

// ============================================================================
// COLOR CONFIGURATION
// ============================================================================

/// Color representation for gauge elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn as_tuple(self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color {0:?}, expected #rrggbb or #rgb")]
pub struct ParseColorError(String);

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseColorError(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }
        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| err());
        match hex.len() {
            6 => Ok(Color::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            // #rgb shorthand: each digit is doubled
            3 => {
                let short = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 0x11);
                Ok(Color::new(short(0)?, short(1)?, short(2)?))
            }
            _ => Err(err()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!("#ef5350".parse(), Ok(Color::new(0xef, 0x53, 0x50)));
        assert_eq!("#FFB74D".parse(), Ok(Color::new(0xff, 0xb7, 0x4d)));
        assert_eq!("#f00".parse(), Ok(Color::new(0xff, 0x00, 0x00)));
    }

    #[test]
    fn rejects_malformed_colors() {
        for input in ["ef5350", "#ef53", "#gg0000", "red", "#+1+1+1"] {
            assert!(input.parse::<Color>().is_err(), "{input}");
        }
    }

    #[test]
    fn displays_as_hex() {
        assert_eq!(Color::new(0x66, 0xbb, 0x6a).to_string(), "#66bb6a");
    }
}
