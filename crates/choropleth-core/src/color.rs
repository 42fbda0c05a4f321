//! Value-to-color mapping for choropleth fills.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Default low stop (`#e5e4fe`).
pub const DEFAULT_LOW: Rgb = Rgb::new(0xe5, 0xe4, 0xfe);
/// Default high stop (`#7f79fb`).
pub const DEFAULT_HIGH: Rgb = Rgb::new(0x7f, 0x79, 0xfb);
/// Neutral fill for features without data (`#eceaf5`).
pub const DEFAULT_NO_DATA: Rgb = Rgb::new(0xec, 0xea, 0xf5);

/// An 8-bit RGB color. Displays as `rgb(r, g, b)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rgb` or `#rrggbb` (the `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self, CoreError> {
        let clean = hex.trim().trim_start_matches('#');
        let expanded: String = match clean.len() {
            3 => clean.chars().flat_map(|c| [c, c]).collect(),
            6 => clean.to_string(),
            _ => return Err(CoreError::InvalidColor(hex.to_string())),
        };
        let int = u32::from_str_radix(&expanded, 16)
            .map_err(|_| CoreError::InvalidColor(hex.to_string()))?;
        Ok(Self::new(
            ((int >> 16) & 0xff) as u8,
            ((int >> 8) & 0xff) as u8,
            (int & 0xff) as u8,
        ))
    }

    /// `#rrggbb` form.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear interpolation towards `other`; `t` is clamped to `[0, 1]`.
    pub fn mix(&self, other: &Rgb, t: f64) -> Rgb {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let channel = |a: u8, b: u8| -> u8 {
            let a = f64::from(a);
            let b = f64::from(b);
            (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
        };
        Rgb::new(
            channel(self.r, other.r),
            channel(self.g, other.g),
            channel(self.b, other.b),
        )
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Minimum and maximum of the finite values in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    /// Range over the finite values, or `None` when there are none.
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some(Self { min: v, max: v }),
                Some(range) => Some(Self {
                    min: range.min.min(v),
                    max: range.max.max(v),
                }),
            })
    }

    /// Whether every value in the range is equal.
    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }
}

/// Position of `value` within `[min, max]`, clamped to `[0, 1]`.
///
/// A zero-width range divides by one instead, so `value == min` maps to 0.
pub fn ratio(value: f64, min: f64, max: f64) -> f64 {
    let span = max - min;
    let denominator = if span == 0.0 || !span.is_finite() { 1.0 } else { span };
    let raw = (value - min) / denominator;
    if raw.is_finite() {
        raw.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// A two-stop gradient plus the neutral no-data fill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorScale {
    pub low: Rgb,
    pub high: Rgb,
    pub no_data: Rgb,
}

impl Default for ColorScale {
    fn default() -> Self {
        Self {
            low: DEFAULT_LOW,
            high: DEFAULT_HIGH,
            no_data: DEFAULT_NO_DATA,
        }
    }
}

impl ColorScale {
    pub fn new(low: Rgb, high: Rgb, no_data: Rgb) -> Self {
        Self { low, high, no_data }
    }

    /// Interpolated color for `value` within `[min, max]`.
    pub fn color_from_value(&self, value: f64, min: f64, max: f64) -> Rgb {
        self.low.mix(&self.high, ratio(value, min, max))
    }

    /// Fill for an optional value; `None` gets the no-data color.
    pub fn fill(&self, value: Option<f64>, range: &ValueRange) -> Rgb {
        match value {
            Some(v) if v.is_finite() => self.color_from_value(v, range.min, range.max),
            _ => self.no_data,
        }
    }
}

/// [`ColorScale::color_from_value`] with the default stops.
pub fn color_from_value(value: f64, min: f64, max: f64) -> Rgb {
    ColorScale::default().color_from_value(value, min, max)
}
