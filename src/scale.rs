//! "Nice" axis bounds.
//!
//! Every axis that needs human-legible bounds goes through [`AxisScaler`], so
//! identical ranges always produce identical axes.

use crate::schema::{ChartSettings, MinMax};
use serde::{Deserialize, Serialize};

/// Slack for float error when snapping to interval multiples.
const SNAP_EPSILON: f64 = 1e-9;

/// Rounds `num` to 1, 2, 5 or 10 times a power of ten.
pub fn nice_number(num: f64) -> f64 {
    if !(num.is_finite() && num > 0.0) {
        return 1.0;
    }

    let exp = num.log10().floor();
    let base = 10f64.powf(exp);
    let f = num / base;
    let nf = if f < 1.5 {
        1.0
    } else if f < 3.0 {
        2.0
    } else if f < 7.0 {
        5.0
    } else {
        10.0
    };
    nf * base
}

/// Decimal places needed to print multiples of `interval` exactly.
fn interval_decimals(interval: f64) -> i32 {
    (-interval.log10().floor()).max(0.0) as i32
}

fn clean(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let cleaned = (value * factor).round() / factor;
    // Avoid -0.0 in output
    if cleaned == 0.0 {
        0.0
    } else {
        cleaned
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NiceScale {
    pub min: f64,
    pub max: f64,
    pub interval: f64,
}

impl NiceScale {
    pub fn extent(&self) -> [f64; 2] {
        [self.min, self.max]
    }

    /// Ascending tick values from `min` to `max` inclusive.
    pub fn ticks(&self) -> Vec<f64> {
        let decimals = interval_decimals(self.interval);
        let steps = ((self.max - self.min) / self.interval).round() as i64;
        (0..=steps)
            .map(|i| clean(self.min + i as f64 * self.interval, decimals))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisScaler {
    split_number: u32,
    headroom: f64,
}

impl Default for AxisScaler {
    fn default() -> Self {
        Self {
            split_number: 5,
            headroom: 1.1,
        }
    }
}

impl AxisScaler {
    pub fn new(split_number: u32, headroom: f64) -> Self {
        Self {
            split_number: split_number.max(1),
            headroom,
        }
    }

    pub fn from_settings(settings: &ChartSettings) -> Self {
        Self::new(settings.split_number, settings.headroom)
    }

    pub fn scale(&self, range: MinMax) -> NiceScale {
        let mut min = range.min;
        let mut max = range.max;

        if min == max {
            if min != 0.0 {
                min -= min.abs() / 2.0;
                max += max.abs() / 2.0;
            } else {
                max = 1.0;
            }
        } else {
            // Keeps the largest point off the boundary, where a polar axis
            // would draw it as a closed half circle.
            max += max.abs() * (self.headroom - 1.0);
        }

        let span = max - min;
        let interval = nice_number(span / self.split_number as f64);
        let decimals = interval_decimals(interval);

        let fix_min = (min / interval + SNAP_EPSILON).floor() * interval;
        let fix_max = (max / interval - SNAP_EPSILON).ceil() * interval;

        NiceScale {
            min: clean(fix_min, decimals),
            max: clean(fix_max, decimals),
            interval,
        }
    }

    pub fn extent(&self, range: MinMax) -> [f64; 2] {
        self.scale(range).extent()
    }

    pub fn ticks(&self, range: MinMax) -> Vec<f64> {
        self.scale(range).ticks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(min: f64, max: f64) -> MinMax {
        MinMax { min, max }
    }

    fn is_multiple(value: f64, interval: f64) -> bool {
        let k = value / interval;
        (k - k.round()).abs() < 1e-6
    }

    #[test]
    fn test_nice_number_thresholds() {
        assert_eq!(nice_number(1.2), 1.0);
        assert_eq!(nice_number(2.9), 2.0);
        assert_eq!(nice_number(218.0), 200.0);
        assert_eq!(nice_number(0.45), 0.5);
        assert_eq!(nice_number(8.0), 10.0);
        assert_eq!(nice_number(0.0), 1.0);
    }

    #[test]
    fn test_regular_range() {
        let scale = AxisScaler::default().scale(range(10.0, 1000.0));
        assert_eq!(scale.interval, 200.0);
        assert_eq!(scale.extent(), [0.0, 1200.0]);
        assert_eq!(
            scale.ticks(),
            vec![0.0, 200.0, 400.0, 600.0, 800.0, 1000.0, 1200.0]
        );
    }

    #[test]
    fn test_degenerate_nonzero_range() {
        let scale = AxisScaler::default().scale(range(100.0, 100.0));
        assert_eq!(scale.interval, 20.0);
        assert_eq!(scale.extent(), [40.0, 160.0]);
    }

    #[test]
    fn test_degenerate_zero_range() {
        let scale = AxisScaler::default().scale(range(0.0, 0.0));
        assert_eq!(scale.interval, 0.2);
        assert_eq!(scale.extent(), [0.0, 1.0]);
        assert_eq!(scale.ticks(), vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
    }

    #[test]
    fn test_bounds_cover_input_and_are_multiples() {
        let scaler = AxisScaler::default();
        let samples = [
            (0.1, 0.3),
            (0.0, 57.3),
            (12.5, 13.0),
            (3.0, 99_999.0),
            (250.0, 250.0),
            (-40.0, 75.0),
        ];
        for (min, max) in samples {
            let scale = scaler.scale(range(min, max));
            assert!(scale.min <= min, "{} > {} for {:?}", scale.min, min, (min, max));
            assert!(scale.max >= max, "{} < {} for {:?}", scale.max, max, (min, max));
            assert!(is_multiple(scale.min, scale.interval));
            assert!(is_multiple(scale.max, scale.interval));
        }
    }

    #[test]
    fn test_deterministic() {
        let scaler = AxisScaler::new(5, 1.1);
        let a = scaler.ticks(range(3.21, 876.5));
        let b = scaler.ticks(range(3.21, 876.5));
        assert_eq!(a, b);
    }
}
