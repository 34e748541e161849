use super::{patch, LayoutBuilder, Ring};
use crate::descriptor::{ChartDescriptor, ANGLE_AXIS, LEGEND, RADIUS_AXIS, SERIES};
use crate::error::Result;
use crate::schema::{ColorMap, Direction, MinMax, TransactionRecord};
use crate::utils::{format_amount, format_datetime, round2, PeriodKey};
use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Marker size for `amount`, interpolated linearly over `range` between the two sizes.
pub fn symbol_size(amount: f64, range: Option<MinMax>, sizes: [f64; 2]) -> f64 {
    let [small, large] = sizes;
    let ratio = match range {
        Some(MinMax { min, max }) if max > min => ((amount - min) / (max - min)).clamp(0.0, 1.0),
        _ => 0.0,
    };
    round2(small + (large - small) * ratio)
}

/// Id → record lookup for scatter point back-references.
#[derive(Debug, Default)]
pub struct RecordIndex<'a> {
    by_id: HashMap<Uuid, &'a TransactionRecord>,
}

impl<'a> RecordIndex<'a> {
    pub fn new(records: &'a [TransactionRecord]) -> Self {
        Self {
            by_id: records.iter().map(|r| (r.id, r)).collect(),
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<&'a TransactionRecord> {
        self.by_id.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Detail shown when hovering a scatter point.
    pub fn tooltip(&self, id: &Uuid, colors: &ColorMap) -> Option<TooltipDetail> {
        let record = self.get(id)?;
        Some(TooltipDetail {
            trade_time: record.trade_time,
            amount: record.amount,
            category: record.category.clone(),
            counterparty: record.counterparty.clone(),
            description: record.description.clone(),
            color: colors
                .color(record.direction, &record.category)
                .map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipDetail {
    pub trade_time: NaiveDateTime,
    pub amount: f64,
    pub category: String,
    pub counterparty: String,
    pub description: String,
    pub color: Option<String>,
}

impl fmt::Display for TooltipDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let or_dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };
        write!(
            f,
            "{}  ¥{}\n[{}]  {}\n{}",
            format_datetime(self.trade_time),
            format_amount(self.amount),
            self.category,
            or_dash(&self.counterparty),
            or_dash(&self.description)
        )
    }
}

/// Records of one direction grouped by category. Categories follow `order`;
/// any not listed there come after, in first-seen order.
fn group_by_category<'r>(
    records: &'r [TransactionRecord],
    direction: Direction,
    order: &[String],
) -> Vec<(String, Vec<&'r TransactionRecord>)> {
    let mut groups: Vec<(String, Vec<&TransactionRecord>)> =
        order.iter().map(|c| (c.clone(), Vec::new())).collect();

    for record in records.iter().filter(|r| r.direction == direction) {
        match groups.iter_mut().find(|(c, _)| *c == record.category) {
            Some((_, items)) => items.push(record),
            None => groups.push((record.category.clone(), vec![record])),
        }
    }

    groups.retain(|(_, items)| !items.is_empty());
    groups
}

/// Per-direction inputs of a scatter ring half that do not depend on the period.
#[derive(Debug, Clone, Copy)]
pub struct ScatterAxes<'a> {
    /// Series order.
    pub categories: &'a [String],
    /// Min/max over all transactions of the direction; drives marker size.
    pub amount_range: Option<MinMax>,
    pub radius_extent: [f64; 2],
}

impl LayoutBuilder {
    /// Outer ring half: one point per transaction of `period`, amount as
    /// radius and trade time as angle, one series per category.
    ///
    /// Returns an empty fragment when the direction has no transactions in
    /// `records`.
    pub fn scatter_ring(
        &self,
        direction: Direction,
        period: PeriodKey,
        records: &[TransactionRecord],
        axes: &ScatterAxes<'_>,
        colors: &ColorMap,
    ) -> Result<ChartDescriptor> {
        let amount_range = axes.amount_range;
        let radius_extent = axes.radius_extent;
        let groups = group_by_category(records, direction, axes.categories);
        if groups.is_empty() {
            return Ok(ChartDescriptor::empty());
        }

        let (start, end) = period.range()?;
        let polar_index = Ring::Scatter.polar_index(direction);
        let sizes = self.settings().symbol_size;

        let series: Vec<Value> = groups
            .iter()
            .map(|(category, items)| {
                let data: Vec<Value> = items
                    .iter()
                    .map(|r| {
                        json!({
                            "id": r.id.to_string(),
                            "value": [r.amount, format_datetime(r.trade_time)],
                            "symbolSize": symbol_size(r.amount, amount_range, sizes),
                        })
                    })
                    .collect();

                let mut scatter = json!({
                    "id": format!("{}-{}", direction.as_str(), category),
                    "name": category,
                    "type": "scatter",
                    "coordinateSystem": "polar",
                    "polarIndex": polar_index,
                    "data": data,
                    "tooltip": { "show": true },
                });
                if let Some(color) = colors.color(direction, category) {
                    scatter["itemStyle"] = json!({ "color": color });
                }
                scatter
            })
            .collect();

        let legend_names: Vec<&str> = groups.iter().map(|(c, _)| c.as_str()).collect();
        let legend_top = match direction {
            Direction::Income => "0px",
            Direction::Expense => "20px",
        };

        let mut descriptor = self.scaffold(Ring::Scatter, direction);
        patch(
            &mut descriptor,
            ANGLE_AXIS,
            0,
            json!({ "min": format_datetime(start), "max": format_datetime(end) }),
        );
        patch(
            &mut descriptor,
            RADIUS_AXIS,
            0,
            json!({ "min": radius_extent[0], "max": radius_extent[1] }),
        );
        descriptor.insert(SERIES, Value::Array(series));
        descriptor.insert(
            LEGEND,
            json!({ "data": legend_names, "top": legend_top }),
        );
        Ok(descriptor)
    }
}
