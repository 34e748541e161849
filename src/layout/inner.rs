use super::{patch, LayoutBuilder, Ring};
use crate::descriptor::{ChartDescriptor, ANGLE_AXIS, RADIUS_AXIS, SERIES};
use crate::schema::{CategoryDeltas, ColorMap, Direction};
use crate::utils::format_amount;
use serde_json::{json, Map, Value};

const CORNER_RADIUS: u32 = 5;
const LABEL_VALUE_COLOR: &str = "#888";

/// Bars of one inner ring half, innermost first. Placeholder slots have an
/// empty category and zero values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InnerData {
    pub category: Vec<String>,
    pub increase: Vec<f64>,
    pub decrease: Vec<f64>,
    pub value: Vec<f64>,
    /// Current-period total per bar, used for the label.
    pub raw_value: Vec<f64>,
    /// Bars backed by data; the rest are padding.
    pub qualifying: usize,
}

impl InnerData {
    /// Which stack segment ends the bar: 0 value, 1 increase, 2 decrease.
    pub fn stack_end(&self, i: usize) -> usize {
        if self.increase[i] > 0.0 {
            1
        } else if self.decrease[i] > 0.0 {
            2
        } else {
            0
        }
    }

    fn segment(&self, stack: usize) -> &[f64] {
        match stack {
            0 => &self.value,
            1 => &self.increase,
            _ => &self.decrease,
        }
    }
}

/// Picks the `n` categories with the largest non-zero `value`, reversed so the
/// largest sits on the outside, padded at the front up to `n`.
pub fn select_inner_data(deltas: &CategoryDeltas, n: usize) -> InnerData {
    let mut ranked: Vec<_> = deltas.iter().filter(|(_, d)| d.value != 0.0).collect();
    ranked.sort_by(|a, b| b.1.value.total_cmp(&a.1.value));
    ranked.truncate(n);
    ranked.reverse();

    let qualifying = ranked.len();
    let padding = n - qualifying;

    let mut data = InnerData {
        qualifying,
        ..InnerData::default()
    };
    for _ in 0..padding {
        data.category.push(String::new());
        data.increase.push(0.0);
        data.decrease.push(0.0);
        data.value.push(0.0);
        data.raw_value.push(0.0);
    }
    for (category, delta) in ranked {
        data.category.push(category.clone());
        data.increase.push(delta.increase);
        data.decrease.push(delta.decrease);
        data.value.push(delta.value);
        data.raw_value.push(delta.current_total());
    }
    data
}

fn segment_items(
    data: &InnerData,
    stack: usize,
    direction: Direction,
    colors: &ColorMap,
) -> Vec<Value> {
    data.segment(stack)
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let category = &data.category[i];
            let color = colors.color(direction, category);
            let is_end = data.stack_end(i) == stack;

            let inner_corner = if stack == 0 { CORNER_RADIUS } else { 0 };
            let outer_corner = if is_end { CORNER_RADIUS } else { 0 };
            let mut item_style = Map::new();
            item_style.insert(
                "borderRadius".to_string(),
                json!([inner_corner, outer_corner, inner_corner, outer_corner]),
            );
            if let (0, Some(color)) = (stack, color) {
                item_style.insert("color".to_string(), json!(color));
            }

            let label = if is_end && !category.is_empty() {
                let mut category_style = json!({ "fontSize": 14, "fontWeight": "bold" });
                if let Some(color) = color {
                    category_style["color"] = json!(color);
                }
                json!({
                    "show": true,
                    "formatter": format!(
                        "{{category|{}}}\n{{value|{}}}",
                        category,
                        format_amount(data.raw_value[i])
                    ),
                    "rich": {
                        "category": category_style,
                        "value": {
                            "fontSize": 14,
                            "color": LABEL_VALUE_COLOR,
                            "fontWeight": "bold",
                        },
                    },
                    "position": "end",
                })
            } else {
                json!({ "show": false })
            };

            json!({
                "value": value,
                "itemStyle": item_style,
                "label": label,
            })
        })
        .collect()
}

impl LayoutBuilder {
    /// Inner ring half: one stacked bar per top category.
    ///
    /// `extent` is the angle axis range, shared by both halves so they read on
    /// the same scale. Returns an empty fragment when no category qualifies.
    pub fn inner_ring(
        &self,
        direction: Direction,
        deltas: &CategoryDeltas,
        extent: [f64; 2],
        colors: &ColorMap,
    ) -> ChartDescriptor {
        let data = select_inner_data(deltas, self.settings().top_n);
        if data.qualifying == 0 {
            return ChartDescriptor::empty();
        }

        let mut descriptor = self.scaffold(Ring::Inner, direction);
        patch(&mut descriptor, RADIUS_AXIS, 0, json!({ "data": data.category }));
        patch(
            &mut descriptor,
            ANGLE_AXIS,
            0,
            json!({ "min": extent[0], "max": extent[1] }),
        );
        for stack in 0..3 {
            let items = segment_items(&data, stack, direction, colors);
            patch(&mut descriptor, SERIES, stack, json!({ "data": items }));
        }
        descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ByDirection, CategoryDelta};
    use std::collections::HashMap;

    fn delta(value: f64, increase: f64, decrease: f64) -> CategoryDelta {
        CategoryDelta {
            increase,
            decrease,
            value,
        }
    }

    fn colors() -> ColorMap {
        let expense: HashMap<String, String> = [("餐饮", "#72adff"), ("购物", "#bf98ff")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ColorMap(ByDirection::new(HashMap::new(), expense))
    }

    #[test]
    fn test_select_top_pads_and_reverses() {
        let deltas: CategoryDeltas = vec![
            ("餐饮".to_string(), delta(100.0, 200.0, 0.0)),
            ("交通".to_string(), delta(0.0, 0.0, 50.0)),
            ("购物".to_string(), delta(400.0, 0.0, 30.0)),
        ];
        let data = select_inner_data(&deltas, 5);
        assert_eq!(data.qualifying, 2);
        assert_eq!(data.category, vec!["", "", "", "餐饮", "购物"]);
        assert_eq!(data.value, vec![0.0, 0.0, 0.0, 100.0, 400.0]);
        assert_eq!(data.raw_value, vec![0.0, 0.0, 0.0, 300.0, 400.0]);
        assert_eq!(data.stack_end(3), 1);
        assert_eq!(data.stack_end(4), 2);
        assert_eq!(data.stack_end(0), 0);
    }

    #[test]
    fn test_select_top_truncates() {
        let deltas: CategoryDeltas = (1..=7)
            .map(|i| (format!("c{}", i), delta(i as f64 * 10.0, 0.0, 0.0)))
            .collect();
        let data = select_inner_data(&deltas, 5);
        assert_eq!(data.category, vec!["c3", "c4", "c5", "c6", "c7"]);
    }

    #[test]
    fn test_empty_when_nothing_qualifies() {
        let deltas: CategoryDeltas = vec![("餐饮".to_string(), delta(0.0, 0.0, 10.0))];
        let builder = LayoutBuilder::default();
        let fragment = builder.inner_ring(Direction::Expense, &deltas, [0.0, 100.0], &colors());
        assert!(fragment.is_empty());
    }

    #[test]
    fn test_inner_ring_segments() {
        let deltas: CategoryDeltas = vec![
            ("餐饮".to_string(), delta(100.0, 200.0, 0.0)),
            ("购物".to_string(), delta(400.0, 0.0, 30.0)),
        ];
        let builder = LayoutBuilder::default();
        let fragment = builder.inner_ring(Direction::Expense, &deltas, [0.0, 600.0], &colors());

        assert_eq!(fragment.items(ANGLE_AXIS)[0]["max"], json!(600.0));
        assert_eq!(fragment.items(ANGLE_AXIS)[0]["polarIndex"], json!(1));
        assert_eq!(
            fragment.items(RADIUS_AXIS)[0]["data"],
            json!(["", "", "", "餐饮", "购物"])
        );

        let series = fragment.items(SERIES);
        assert_eq!(series.len(), 3);

        // 餐饮 grows: value segment is the base, increase segment carries the label
        let value_item = &series[0]["data"][3];
        assert_eq!(value_item["value"], json!(100.0));
        assert_eq!(value_item["itemStyle"]["color"], json!("#72adff"));
        assert_eq!(value_item["itemStyle"]["borderRadius"], json!([5, 0, 5, 0]));
        assert_eq!(value_item["label"]["show"], json!(false));

        let increase_item = &series[1]["data"][3];
        assert_eq!(increase_item["itemStyle"]["borderRadius"], json!([0, 5, 0, 5]));
        assert!(increase_item["itemStyle"].get("color").is_none());
        assert_eq!(
            increase_item["label"]["formatter"],
            json!("{category|餐饮}\n{value|300}")
        );

        // 购物 shrinks: decrease segment ends the bar
        let decrease_item = &series[2]["data"][4];
        assert_eq!(decrease_item["value"], json!(30.0));
        assert_eq!(decrease_item["label"]["show"], json!(true));
        assert_eq!(series[0]["data"][4]["label"]["show"], json!(false));

        // padding never carries a label
        assert_eq!(series[0]["data"][0]["label"]["show"], json!(false));
    }

    #[test]
    fn test_missing_color_falls_back_to_renderer_default() {
        let deltas: CategoryDeltas = vec![("未知".to_string(), delta(50.0, 0.0, 0.0))];
        let builder = LayoutBuilder::default();
        let fragment = builder.inner_ring(Direction::Expense, &deltas, [0.0, 100.0], &colors());
        let item = &fragment.items(SERIES)[0]["data"][4];
        assert!(item["itemStyle"].get("color").is_none());
        assert!(item["label"]["rich"]["category"].get("color").is_none());
        assert_eq!(item["itemStyle"]["borderRadius"], json!([5, 5, 5, 5]));
    }
}
