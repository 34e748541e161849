//! Layout builders for the three rings.
//!
//! Each ring is split into an income half and an expense half, every half with
//! its own polar region. Polar indices are fixed:
//!
//! | ring    | income | expense |
//! |---------|--------|---------|
//! | inner   | 0      | 1       |
//! | trend   | 2      | 3       |
//! | scatter | 4      | 5       |

pub mod inner;
pub mod scaffold;
pub mod scatter;
pub mod trend;

pub use inner::{select_inner_data, InnerData};
pub use scaffold::{create_scaffold, ScaffoldCache};
pub use scatter::{symbol_size, RecordIndex, ScatterAxes, TooltipDetail};

use crate::descriptor::{ChartDescriptor, LEGEND, SERIES};
use crate::error::Result;
use crate::scale::AxisScaler;
use crate::schema::{ChartSettings, Direction};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ring {
    /// Category ranking with period-over-period swing.
    Inner,
    /// Per-day stacked totals.
    Trend,
    /// One point per transaction.
    Scatter,
}

impl Ring {
    pub const ALL: [Ring; 3] = [Ring::Inner, Ring::Trend, Ring::Scatter];

    pub fn polar_index(&self, direction: Direction) -> usize {
        let base = match self {
            Ring::Inner => 0,
            Ring::Trend => 2,
            Ring::Scatter => 4,
        };
        base + match direction {
            Direction::Income => 0,
            Direction::Expense => 1,
        }
    }
}

/// Turns aggregated data into descriptor fragments, one ring half at a time.
#[derive(Debug)]
pub struct LayoutBuilder {
    settings: ChartSettings,
    scaler: AxisScaler,
    cache: ScaffoldCache,
}

impl Default for LayoutBuilder {
    fn default() -> Self {
        let settings = ChartSettings::default();
        Self {
            scaler: AxisScaler::from_settings(&settings),
            settings,
            cache: ScaffoldCache::new(),
        }
    }
}

impl LayoutBuilder {
    pub fn new(settings: ChartSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            scaler: AxisScaler::from_settings(&settings),
            settings,
            cache: ScaffoldCache::new(),
        })
    }

    pub fn settings(&self) -> &ChartSettings {
        &self.settings
    }

    pub fn scaler(&self) -> &AxisScaler {
        &self.scaler
    }

    pub fn cache(&self) -> &ScaffoldCache {
        &self.cache
    }

    /// A fresh copy of the ring half's scaffold.
    pub fn scaffold(&self, ring: Ring, direction: Direction) -> ChartDescriptor {
        self.cache.scaffold(ring, direction)
    }

    /// Stand-in for a ring half without data: its region and axes, no series.
    /// Keeps the polar regions of the following rings at their fixed indices.
    pub fn placeholder(&self, ring: Ring, direction: Direction) -> ChartDescriptor {
        let mut descriptor = self.scaffold(ring, direction);
        descriptor.remove(SERIES);
        descriptor.remove(LEGEND);
        descriptor
    }
}

/// Overwrites fields of the object at `descriptor[key][index]`.
pub(crate) fn patch(descriptor: &mut ChartDescriptor, key: &str, index: usize, fields: Value) {
    let Some(Value::Object(target)) = descriptor.get_mut(key).and_then(|v| v.get_mut(index))
    else {
        return;
    };
    if let Value::Object(fields) = fields {
        target.extend(fields);
    }
}
