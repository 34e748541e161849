use super::{patch, LayoutBuilder, Ring};
use crate::descriptor::{ChartDescriptor, ANGLE_AXIS, RADIUS_AXIS, SERIES};
use crate::schema::{ColorMap, Direction};
use crate::utils::format_date;
use chrono::NaiveDate;
use serde_json::{json, Value};

const SMOOTHING: f64 = 0.4;

/// Points of one category as `[amount, day]` pairs, closed into a loop by
/// repeating the first day at the end.
pub fn closed_loop_points(values: &[f64], days: &[String]) -> Vec<Value> {
    let mut points: Vec<Value> = values
        .iter()
        .zip(days)
        .map(|(amount, day)| json!([amount, day]))
        .collect();
    if let Some(first) = points.first().cloned() {
        points.push(first);
    }
    points
}

impl LayoutBuilder {
    /// Middle ring half: one stacked area per category over the days of a period.
    ///
    /// `series` holds the zero-filled daily totals per category in rank order,
    /// `radius_extent` the radius axis range. Returns an empty fragment when
    /// there is nothing to plot.
    pub fn trend_ring(
        &self,
        direction: Direction,
        days: &[NaiveDate],
        series: &[(String, Vec<f64>)],
        radius_extent: [f64; 2],
        colors: &ColorMap,
    ) -> ChartDescriptor {
        if days.is_empty() || series.is_empty() {
            return ChartDescriptor::empty();
        }

        let polar_index = Ring::Trend.polar_index(direction);
        let name = direction.as_str();
        let day_labels: Vec<String> = days.iter().map(|d| format_date(*d)).collect();

        let lines: Vec<Value> = series
            .iter()
            .map(|(category, values)| {
                let mut line = json!({
                    "name": format!("{}-{}", name, category),
                    "type": "line",
                    "coordinateSystem": "polar",
                    "polarIndex": polar_index,
                    "stack": format!("outer-{}", name),
                    "data": closed_loop_points(values, &day_labels),
                    "showSymbol": false,
                    "smooth": SMOOTHING,
                    "silent": true,
                });
                if let Some(color) = colors.color(direction, category) {
                    line["itemStyle"] = json!({ "color": color });
                    line["lineStyle"] = json!({ "color": color });
                    line["areaStyle"] = json!({ "color": color });
                }
                line
            })
            .collect();

        let mut descriptor = self.scaffold(Ring::Trend, direction);
        patch(&mut descriptor, ANGLE_AXIS, 0, json!({ "data": day_labels }));
        patch(
            &mut descriptor,
            RADIUS_AXIS,
            0,
            json!({ "min": radius_extent[0], "max": radius_extent[1] }),
        );
        descriptor.insert(SERIES, Value::Array(lines));
        descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ByDirection;
    use std::collections::HashMap;

    fn days(n: u32) -> Vec<NaiveDate> {
        (1..=n)
            .map(|d| NaiveDate::from_ymd_opt(2024, 4, d).unwrap())
            .collect()
    }

    #[test]
    fn test_closed_loop_points() {
        let labels = vec!["2024-04-01".to_string(), "2024-04-02".to_string()];
        let points = closed_loop_points(&[3.0, 4.0], &labels);
        assert_eq!(
            points,
            vec![
                json!([3.0, "2024-04-01"]),
                json!([4.0, "2024-04-02"]),
                json!([3.0, "2024-04-01"]),
            ]
        );
        assert!(closed_loop_points(&[], &[]).is_empty());
    }

    #[test]
    fn test_trend_ring_series() {
        let income: HashMap<String, String> =
            [("工资".to_string(), "#72adff".to_string())].into_iter().collect();
        let colors = ColorMap(ByDirection::new(income, HashMap::new()));
        let series = vec![
            ("工资".to_string(), vec![0.0, 5000.0, 0.0]),
            ("红包".to_string(), vec![8.8, 0.0, 0.0]),
        ];

        let fragment = LayoutBuilder::default().trend_ring(
            Direction::Income,
            &days(3),
            &series,
            [0.0, 6000.0],
            &colors,
        );

        let lines = fragment.items(SERIES);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["name"], json!("income-工资"));
        assert_eq!(lines[0]["polarIndex"], json!(2));
        assert_eq!(lines[0]["stack"], json!("outer-income"));
        assert_eq!(lines[0]["data"].as_array().unwrap().len(), 4);
        assert_eq!(lines[0]["areaStyle"]["color"], json!("#72adff"));
        assert!(lines[1].get("areaStyle").is_none());

        assert_eq!(fragment.items(RADIUS_AXIS)[0]["max"], json!(6000.0));
        assert_eq!(
            fragment.items(ANGLE_AXIS)[0]["data"],
            json!(["2024-04-01", "2024-04-02", "2024-04-03"])
        );
    }

    #[test]
    fn test_trend_ring_empty() {
        let fragment = LayoutBuilder::default().trend_ring(
            Direction::Expense,
            &days(30),
            &[],
            [0.0, 1.0],
            &ColorMap::default(),
        );
        assert!(fragment.is_empty());
    }
}
