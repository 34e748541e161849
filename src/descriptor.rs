use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const POLAR: &str = "polar";
pub const ANGLE_AXIS: &str = "angleAxis";
pub const RADIUS_AXIS: &str = "radiusAxis";
pub const SERIES: &str = "series";
pub const LEGEND: &str = "legend";
pub const TOOLTIP: &str = "tooltip";

/// Declarative chart configuration handed to the renderer, keyed by dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartDescriptor(Map<String, Value>);

impl ChartDescriptor {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Elements under `key`: the array itself, a single non-array value as one
    /// element, or nothing.
    pub fn items(&self, key: &str) -> &[Value] {
        match self.0.get(key) {
            Some(Value::Array(items)) => items,
            Some(value) => std::slice::from_ref(value),
            None => &[],
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn to_json(&self) -> crate::error::Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_json_string(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Merges `other` after `self`, see [`merge`].
    pub fn merge(self, other: ChartDescriptor) -> ChartDescriptor {
        merge(self, other)
    }
}

impl From<Map<String, Value>> for ChartDescriptor {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Combines two partial descriptors key by key.
///
/// A key on one side only passes through. Two arrays are concatenated, left
/// first. A lone non-array value is boxed and joined with the partner array,
/// and two non-array values become a two-element array.
pub fn merge(left: ChartDescriptor, right: ChartDescriptor) -> ChartDescriptor {
    let mut result = left.0;

    for (key, right_value) in right.0 {
        let merged = match result.remove(&key) {
            None => right_value,
            Some(left_value) => combine(left_value, right_value),
        };
        result.insert(key, merged);
    }

    ChartDescriptor(result)
}

fn combine(left: Value, right: Value) -> Value {
    match (left, right) {
        (Value::Array(mut l), Value::Array(r)) => {
            l.extend(r);
            Value::Array(l)
        }
        (Value::Array(mut l), r) => {
            l.push(r);
            Value::Array(l)
        }
        (l, Value::Array(r)) => {
            let mut items = Vec::with_capacity(r.len() + 1);
            items.push(l);
            items.extend(r);
            Value::Array(items)
        }
        (l, r) => Value::Array(vec![l, r]),
    }
}

/// Folds any number of fragments left to right.
pub fn merge_all(fragments: impl IntoIterator<Item = ChartDescriptor>) -> ChartDescriptor {
    fragments
        .into_iter()
        .fold(ChartDescriptor::empty(), merge)
}
