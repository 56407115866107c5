//! Radiometric frames and temperature conversion.

use crate::{Error, Result};

/// Temperature resolution of one raw sensor count, in Kelvin.
pub const KELVIN_PER_COUNT: f64 = 0.04;

/// Offset between Kelvin and degrees Celsius.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Converts a raw radiometric sensor value to degrees Celsius.
#[inline]
#[must_use]
pub fn raw_to_celsius(raw: u16) -> f64 {
    f64::from(raw) * KELVIN_PER_COUNT - KELVIN_OFFSET
}

/// Maps a temperature into `[min, max]` and scales it to an 8-bit intensity.
///
/// Values outside the range clamp to 0 or 255. A degenerate range acts as
/// a threshold at `max`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn normalize_to_u8(value: f64, min: f64, max: f64) -> u8 {
    let t = unit_interval(value, min, max);
    (t * 255.0).round() as u8
}

/// Maps a value into `[0, 1]` relative to `[min, max]`, clamping outliers.
///
/// NaN maps to 0; callers that treat NaN specially must check first.
#[must_use]
pub fn unit_interval(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    let span = max - min;
    if span <= 0.0 || !span.is_finite() {
        return if value >= max { 1.0 } else { 0.0 };
    }
    ((value - min) / span).clamp(0.0, 1.0)
}

/// A single-channel frame of raw sensor values, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadiometricFrame {
    width: usize,
    height: usize,
    data: Vec<u16>,
}

impl RadiometricFrame {
    /// Creates a frame from raw values.
    ///
    /// # Errors
    /// Returns `MalformedData` if `data.len() != width * height`.
    pub fn new(width: usize, height: usize, data: Vec<u16>) -> Result<Self> {
        if data.len() != width.saturating_mul(height) {
            return Err(Error::MalformedData(format!(
                "frame of {width}x{height} needs {} values, got {}",
                width.saturating_mul(height),
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw values, row-major.
    #[must_use]
    pub fn raw(&self) -> &[u16] {
        &self.data
    }

    /// Raw value at `(x, y)`.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<u16> {
        (x < self.width && y < self.height).then(|| self.data[y * self.width + x])
    }

    /// Temperatures in degrees Celsius, row-major.
    pub fn celsius(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().map(|&raw| raw_to_celsius(raw))
    }

    /// Temperatures of the interior left after discarding `margin` pixels on every side.
    ///
    /// Empty when the margin consumes the whole frame.
    #[must_use]
    pub fn interior_celsius(&self, margin: usize) -> Vec<f64> {
        let x_end = self.width.saturating_sub(margin);
        let y_end = self.height.saturating_sub(margin);
        if margin >= x_end || margin >= y_end {
            return Vec::new();
        }
        (margin..y_end)
            .flat_map(|y| {
                let row = &self.data[y * self.width..(y + 1) * self.width];
                row[margin..x_end].iter().map(|&raw| raw_to_celsius(raw))
            })
            .collect()
    }
}
