//! Static per-direction chart scaffolds and their write-once cache.

use super::Ring;
use crate::descriptor::{ChartDescriptor, ANGLE_AXIS, POLAR, RADIUS_AXIS, SERIES, TOOLTIP};
use crate::schema::Direction;
use serde_json::{json, Value};
use std::sync::OnceLock;

pub const AXIS_LINE_COLOR: &str = "#ddd";
pub const LABEL_COLOR: &str = "#999";
pub const INCREASE_COLOR: &str = "#f5222d";
pub const DECREASE_COLOR: &str = "#52c41a";

fn descriptor(value: Value) -> ChartDescriptor {
    match value {
        Value::Object(map) => ChartDescriptor::from(map),
        _ => ChartDescriptor::empty(),
    }
}

fn polar_region(direction: Direction, ring: Ring) -> Value {
    let radius = match (ring, direction) {
        (Ring::Inner, _) => ["0%", "30%"],
        (_, Direction::Income) => ["30%", "60%"],
        (_, Direction::Expense) => ["60%", "90%"],
    };
    json!({
        "center": ["50%", "50%"],
        "radius": radius,
    })
}

fn inner_scaffold(direction: Direction) -> ChartDescriptor {
    let polar_index = Ring::Inner.polar_index(direction);
    let (start_angle, end_angle) = match direction {
        Direction::Income => (90, -90),
        Direction::Expense => (-90, -270),
    };
    let name = direction.as_str();

    let bar = |part: &str, item_style: Value| {
        let mut series = json!({
            "name": format!("{}-{}", name, part),
            "type": "bar",
            "coordinateSystem": "polar",
            "polarIndex": polar_index,
            "stack": name,
        });
        if !item_style.is_null() {
            series["itemStyle"] = item_style;
        }
        series
    };

    descriptor(json!({
        POLAR: [polar_region(direction, Ring::Inner)],
        ANGLE_AXIS: [{
            "polarIndex": polar_index,
            "startAngle": start_angle,
            "endAngle": end_angle,
            "axisTick": { "show": false },
            "axisLine": { "lineStyle": { "color": AXIS_LINE_COLOR, "width": 4 } },
            "splitLine": { "show": false },
            "axisLabel": { "show": false },
        }],
        RADIUS_AXIS: [{
            "polarIndex": polar_index,
            "type": "category",
            "inverse": true,
            "axisTick": { "show": false },
            "axisLine": {
                "lineStyle": { "color": AXIS_LINE_COLOR, "width": 3, "type": "dashed" }
            },
            "axisLabel": { "show": false },
        }],
        SERIES: [
            bar("value", Value::Null),
            bar("increase", json!({ "color": INCREASE_COLOR })),
            bar("decrease", json!({
                "color": DECREASE_COLOR,
                "opacity": 0.5,
                "borderWidth": 2,
                "borderColor": "#000",
                "borderType": "dashed",
            })),
        ],
    }))
}

/// Trend and scatter rings share one layout; only the trend ring shows its axes.
fn outer_scaffold(direction: Direction, ring: Ring) -> ChartDescriptor {
    let polar_index = ring.polar_index(direction);
    let is_income = direction == Direction::Income;
    let is_line = ring == Ring::Trend;

    descriptor(json!({
        POLAR: [polar_region(direction, ring)],
        ANGLE_AXIS: [{
            "polarIndex": polar_index,
            "show": is_line,
            "type": if is_line { "category" } else { "time" },
            "axisLine": {
                "show": is_income,
                "lineStyle": { "color": AXIS_LINE_COLOR, "width": 3 },
            },
            "axisLabel": {
                "show": is_income,
                "color": LABEL_COLOR,
                "fontSize": 14,
                "fontWeight": "bold",
            },
            "axisTick": { "show": false },
            "splitLine": { "show": true, "lineStyle": { "color": AXIS_LINE_COLOR } },
        }],
        RADIUS_AXIS: [{
            "polarIndex": polar_index,
            "show": is_line,
            "inverse": is_income,
            "type": "value",
            "axisLine": { "show": true, "lineStyle": { "color": LABEL_COLOR, "width": 2 } },
            "axisLabel": {
                "show": true,
                "color": LABEL_COLOR,
                "fontSize": 14,
                "fontWeight": "bold",
            },
            "axisTick": { "show": false },
            "splitLine": { "lineStyle": { "color": AXIS_LINE_COLOR } },
        }],
        TOOLTIP: {},
    }))
}

/// Builds the data-independent part of one ring half.
pub fn create_scaffold(ring: Ring, direction: Direction) -> ChartDescriptor {
    match ring {
        Ring::Inner => inner_scaffold(direction),
        Ring::Trend | Ring::Scatter => outer_scaffold(direction, ring),
    }
}

/// Write-once store of the six ring-half scaffolds.
///
/// Each slot is initialized at most once, even under concurrent first access;
/// callers always receive their own copy.
#[derive(Debug, Default)]
pub struct ScaffoldCache {
    slots: [OnceLock<ChartDescriptor>; 6],
}

impl ScaffoldCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache with every scaffold already built.
    pub fn eager() -> Self {
        let cache = Self::new();
        for ring in Ring::ALL {
            for direction in Direction::ALL {
                cache.scaffold(ring, direction);
            }
        }
        cache
    }

    fn slot(&self, ring: Ring, direction: Direction) -> &OnceLock<ChartDescriptor> {
        &self.slots[ring.polar_index(direction)]
    }

    pub fn scaffold(&self, ring: Ring, direction: Direction) -> ChartDescriptor {
        self.slot(ring, direction)
            .get_or_init(|| create_scaffold(ring, direction))
            .clone()
    }

    pub fn is_cached(&self, ring: Ring, direction: Direction) -> bool {
        self.slot(ring, direction).get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_fills_lazily() {
        let cache = ScaffoldCache::new();
        assert!(!cache.is_cached(Ring::Inner, Direction::Income));
        let _ = cache.scaffold(Ring::Inner, Direction::Income);
        assert!(cache.is_cached(Ring::Inner, Direction::Income));
        assert!(!cache.is_cached(Ring::Inner, Direction::Expense));
    }

    #[test]
    fn test_eager_cache_is_full() {
        let cache = ScaffoldCache::eager();
        for ring in Ring::ALL {
            for direction in Direction::ALL {
                assert!(cache.is_cached(ring, direction));
            }
        }
    }

    #[test]
    fn test_copies_do_not_leak_back() {
        let cache = ScaffoldCache::new();
        let mut first = cache.scaffold(Ring::Trend, Direction::Expense);
        first.insert(SERIES, json!(["leaked"]));
        let second = cache.scaffold(Ring::Trend, Direction::Expense);
        assert!(second.get(SERIES).is_none());
    }

    #[test]
    fn test_scaffold_polar_indices() {
        let inner = create_scaffold(Ring::Inner, Direction::Expense);
        assert_eq!(inner.items(ANGLE_AXIS)[0]["polarIndex"], json!(1));
        assert_eq!(inner.items(ANGLE_AXIS)[0]["startAngle"], json!(-90));
        assert_eq!(inner.items(SERIES).len(), 3);
        assert_eq!(inner.items(SERIES)[2]["name"], json!("expense-decrease"));
        assert!(inner.items(SERIES)[0].get("itemStyle").is_none());

        let scatter = create_scaffold(Ring::Scatter, Direction::Income);
        assert_eq!(scatter.items(RADIUS_AXIS)[0]["polarIndex"], json!(4));
        assert_eq!(scatter.items(ANGLE_AXIS)[0]["type"], json!("time"));
        assert_eq!(scatter.items(POLAR)[0]["radius"], json!(["30%", "60%"]));
    }
}
