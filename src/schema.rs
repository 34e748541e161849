use crate::error::{BillChartError, Result};
use chrono::NaiveDateTime;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Textual view of the cell. Integral numbers render without a fraction so
    /// that numeric order ids survive unchanged.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Empty => String::new(),
        }
    }

    pub fn is_marker(&self, marker: &str) -> bool {
        matches!(self, Cell::Text(s) if s.trim() == marker)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum Direction {
    Income,
    Expense,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Income, Direction::Expense];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Income => "income",
            Direction::Expense => "expense",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ByDirection<T> {
    pub income: T,
    pub expense: T,
}

impl<T> ByDirection<T> {
    pub fn new(income: T, expense: T) -> Self {
        Self { income, expense }
    }

    pub fn get(&self, direction: Direction) -> &T {
        match direction {
            Direction::Income => &self.income,
            Direction::Expense => &self.expense,
        }
    }

    pub fn get_mut(&mut self, direction: Direction) -> &mut T {
        match direction {
            Direction::Income => &mut self.income,
            Direction::Expense => &mut self.expense,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(Direction, T) -> U) -> ByDirection<U> {
        ByDirection {
            income: f(Direction::Income, self.income),
            expense: f(Direction::Expense, self.expense),
        }
    }
}

/// Order number column. Missing values serialize as the `-1` sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawOrderId", into = "RawOrderId")]
pub enum OrderId {
    Known(String),
    Absent,
}

impl OrderId {
    pub fn from_cell(cell: &Cell) -> Self {
        let text = cell.to_text();
        let text = text.trim();
        if text.is_empty() || text == "-1" {
            OrderId::Absent
        } else {
            OrderId::Known(text.to_string())
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawOrderId {
    Sentinel(i64),
    Text(String),
}

impl From<RawOrderId> for OrderId {
    fn from(raw: RawOrderId) -> Self {
        match raw {
            RawOrderId::Sentinel(-1) => OrderId::Absent,
            RawOrderId::Sentinel(n) => OrderId::Known(n.to_string()),
            RawOrderId::Text(s) if s.is_empty() => OrderId::Absent,
            RawOrderId::Text(s) => OrderId::Known(s),
        }
    }
}

impl From<OrderId> for RawOrderId {
    fn from(id: OrderId) -> Self {
        match id {
            OrderId::Known(s) => RawOrderId::Text(s),
            OrderId::Absent => RawOrderId::Sentinel(-1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub trade_time: NaiveDateTime,
    pub category: String,
    pub counterparty: String,
    pub counterparty_account: String,
    pub description: String,
    pub direction: Direction,
    pub amount: f64,
    pub payment_method: String,
    pub status: String,
    pub trade_order_id: OrderId,
    pub merchant_order_id: OrderId,
    pub remark: String,
}

/// Period-over-period swing of one category.
///
/// `value` is the baseline before the swing; at most one of `increase` and
/// `decrease` is non-zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryDelta {
    pub increase: f64,
    pub decrease: f64,
    pub value: f64,
}

impl CategoryDelta {
    pub fn current_total(&self) -> f64 {
        crate::utils::round2(self.value + self.increase)
    }
}

pub type CategoryDeltas = Vec<(String, CategoryDelta)>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMax {
    pub min: f64,
    pub max: f64,
}

impl MinMax {
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values.into_iter().fold(None, |acc, v| match acc {
            None => Some(MinMax { min: v, max: v }),
            Some(m) => Some(MinMax {
                min: m.min.min(v),
                max: m.max.max(v),
            }),
        })
    }

    pub fn union(self, other: MinMax) -> MinMax {
        MinMax {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// `None` for a direction without any transactions.
pub type TradeMinMax = ByDirection<Option<MinMax>>;

pub type CategoryRank = ByDirection<Vec<String>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorMap(pub ByDirection<HashMap<String, String>>);

impl ColorMap {
    pub fn color(&self, direction: Direction, category: &str) -> Option<&str> {
        self.0.get(direction).get(category).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DeltaThresholds {
    #[schemars(
        description = "Swings smaller than this absolute amount are reported as no change."
    )]
    pub min_absolute: f64,

    #[schemars(
        description = "Swings smaller than this fraction of the current total are reported as no change."
    )]
    pub min_ratio: f64,
}

impl Default for DeltaThresholds {
    fn default() -> Self {
        Self {
            min_absolute: 10.0,
            min_ratio: 0.05,
        }
    }
}

pub const DEFAULT_PALETTE: [&str; 8] = [
    "#72adff", "#bf98ff", "#ff80c8", "#ff8b69", "#629f00", "#94b81f", "#00c292", "#00bcd7",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ChartSettings {
    #[schemars(description = "Number of categories shown on each half of the inner ring.")]
    pub top_n: usize,

    #[schemars(
        description = "Colors assigned to categories by rank, wrapping around when there are more categories than colors."
    )]
    pub palette: Vec<String>,

    #[schemars(description = "Smallest and largest scatter marker size in pixels.")]
    pub symbol_size: [f64; 2],

    #[schemars(description = "Number of intervals an axis is split into before rounding.")]
    pub split_number: u32,

    #[schemars(
        description = "Factor applied to the maximum of a range so no data point sits on the axis boundary. Must be at least 1.0."
    )]
    pub headroom: f64,

    #[schemars(description = "Noise suppression for period-over-period deltas.")]
    pub delta_thresholds: DeltaThresholds,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            top_n: 5,
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            symbol_size: [10.0, 48.0],
            split_number: 5,
            headroom: 1.1,
            delta_thresholds: DeltaThresholds::default(),
        }
    }
}

impl ChartSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: ChartSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |field: &str, details: String| BillChartError::InvalidSettings {
            field: field.to_string(),
            details,
        };

        if self.top_n == 0 {
            return Err(invalid("top_n", "must be at least 1".to_string()));
        }
        if self.palette.is_empty() {
            return Err(invalid("palette", "must contain at least one color".to_string()));
        }
        let [min_size, max_size] = self.symbol_size;
        if !(min_size >= 0.0 && min_size <= max_size) {
            return Err(invalid(
                "symbol_size",
                format!("expected 0 <= min <= max, got [{}, {}]", min_size, max_size),
            ));
        }
        if self.split_number == 0 {
            return Err(invalid("split_number", "must be at least 1".to_string()));
        }
        if !(self.headroom >= 1.0 && self.headroom.is_finite()) {
            return Err(invalid(
                "headroom",
                format!("must be a finite factor >= 1.0, got {}", self.headroom),
            ));
        }
        if self.delta_thresholds.min_absolute < 0.0 || self.delta_thresholds.min_ratio < 0.0 {
            return Err(invalid(
                "delta_thresholds",
                "thresholds must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ChartSettings)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
