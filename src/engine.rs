use crate::schema::*;
use crate::utils::{round2, PeriodKey};
use chrono::NaiveDate;
use log::debug;
use std::collections::{BTreeMap, HashMap};

pub type PeriodGroups = BTreeMap<PeriodKey, Vec<TransactionRecord>>;

pub type PeriodDeltas = BTreeMap<PeriodKey, ByDirection<CategoryDeltas>>;

#[derive(Debug, Clone)]
pub struct Aggregator {
    thresholds: DeltaThresholds,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DeltaThresholds::default())
    }
}

impl Aggregator {
    pub fn new(thresholds: DeltaThresholds) -> Self {
        Self { thresholds }
    }

    /// Category names per direction, by descending total over all records.
    /// Equal totals keep first-seen order.
    pub fn rank_categories(&self, records: &[TransactionRecord]) -> CategoryRank {
        let mut totals: ByDirection<Vec<(String, f64)>> = ByDirection::default();

        for record in records {
            let bucket = totals.get_mut(record.direction);
            match bucket.iter_mut().find(|(name, _)| *name == record.category) {
                Some((_, total)) => *total = round2(*total + record.amount),
                None => bucket.push((record.category.clone(), record.amount)),
            }
        }

        totals.map(|_, mut sums| {
            sums.sort_by(|a, b| b.1.total_cmp(&a.1));
            sums.into_iter().map(|(name, _)| name).collect()
        })
    }

    pub fn assign_colors(&self, rank: &CategoryRank, palette: &[String]) -> ColorMap {
        let assign = |categories: &Vec<String>| -> HashMap<String, String> {
            if palette.is_empty() {
                return HashMap::new();
            }
            categories
                .iter()
                .enumerate()
                .map(|(i, c)| (c.clone(), palette[i % palette.len()].clone()))
                .collect()
        };
        ColorMap(ByDirection::new(
            assign(&rank.income),
            assign(&rank.expense),
        ))
    }

    pub fn group_by_period(
        &self,
        records: &[TransactionRecord],
        allow: Option<&[PeriodKey]>,
    ) -> PeriodGroups {
        let mut groups = PeriodGroups::new();
        for record in records {
            let key = PeriodKey::of(record.trade_time.date());
            if allow.is_some_and(|keys| !keys.contains(&key)) {
                continue;
            }
            groups.entry(key).or_default().push(record.clone());
        }
        groups
    }

    pub fn category_totals(
        &self,
        records: &[TransactionRecord],
        direction: Direction,
        categories: &[String],
    ) -> Vec<(String, f64)> {
        let mut totals: Vec<(String, f64)> =
            categories.iter().map(|c| (c.clone(), 0.0)).collect();

        for record in records.iter().filter(|r| r.direction == direction) {
            if let Some((_, total)) = totals.iter_mut().find(|(c, _)| *c == record.category) {
                *total = round2(*total + record.amount);
            }
        }
        totals
    }

    pub fn compute_delta(&self, previous: f64, current: f64) -> CategoryDelta {
        let mut diff = if previous == 0.0 {
            0.0
        } else {
            round2(current - previous)
        };

        let below_absolute = diff.abs() < self.thresholds.min_absolute;
        let below_ratio = current != 0.0 && diff.abs() / current < self.thresholds.min_ratio;
        if below_absolute || below_ratio {
            diff = 0.0;
        }

        CategoryDelta {
            increase: if diff > 0.0 { diff } else { 0.0 },
            decrease: if diff < 0.0 { -diff } else { 0.0 },
            value: if diff > 0.0 {
                round2(current - diff)
            } else {
                current
            },
        }
    }

    /// Deltas for every period, each against the period before it. The first
    /// period has no baseline and reports no swing.
    pub fn category_deltas(&self, groups: &PeriodGroups, rank: &CategoryRank) -> PeriodDeltas {
        let mut deltas = PeriodDeltas::new();
        let mut previous: Option<ByDirection<Vec<(String, f64)>>> = None;

        for (period, records) in groups {
            let current = ByDirection::new(
                self.category_totals(records, Direction::Income, &rank.income),
                self.category_totals(records, Direction::Expense, &rank.expense),
            );

            let period_deltas = ByDirection::new(
                self.deltas_against(previous.as_ref().map(|p| &p.income), &current.income),
                self.deltas_against(previous.as_ref().map(|p| &p.expense), &current.expense),
            );

            debug!(
                "Period {}: {} income / {} expense categories",
                period,
                period_deltas.income.len(),
                period_deltas.expense.len()
            );

            deltas.insert(*period, period_deltas);
            previous = Some(current);
        }

        deltas
    }

    fn deltas_against(
        &self,
        previous: Option<&Vec<(String, f64)>>,
        current: &[(String, f64)],
    ) -> CategoryDeltas {
        current
            .iter()
            .enumerate()
            .map(|(i, (category, total))| {
                // Both sides follow the same rank order
                let last = previous.and_then(|p| p.get(i)).map_or(0.0, |(_, v)| *v);
                (category.clone(), self.compute_delta(last, *total))
            })
            .collect()
    }

    pub fn trade_min_max(&self, records: &[TransactionRecord]) -> TradeMinMax {
        ByDirection::new(
            MinMax::from_values(
                records
                    .iter()
                    .filter(|r| r.direction == Direction::Income)
                    .map(|r| r.amount),
            ),
            MinMax::from_values(
                records
                    .iter()
                    .filter(|r| r.direction == Direction::Expense)
                    .map(|r| r.amount),
            ),
        )
    }

    pub fn category_total_min_max(&self, groups: &PeriodGroups, rank: &CategoryRank) -> TradeMinMax {
        let mut result: TradeMinMax = ByDirection::default();
        for records in groups.values() {
            for direction in Direction::ALL {
                let totals = self.category_totals(records, direction, rank.get(direction));
                let range = MinMax::from_values(
                    totals.iter().map(|(_, v)| *v).filter(|v| *v > 0.0),
                );
                let slot = result.get_mut(direction);
                *slot = match (*slot, range) {
                    (Some(a), Some(b)) => Some(a.union(b)),
                    (a, b) => a.or(b),
                };
            }
        }
        result
    }

    /// Zero-filled daily totals in `categories` order; categories without a
    /// transaction in the range are left out.
    pub fn daily_category_series(
        &self,
        records: &[TransactionRecord],
        direction: Direction,
        categories: &[String],
        days: &[NaiveDate],
    ) -> Vec<(String, Vec<f64>)> {
        let day_index: HashMap<NaiveDate, usize> =
            days.iter().enumerate().map(|(i, d)| (*d, i)).collect();

        let mut series: Vec<(String, Vec<f64>, bool)> = categories
            .iter()
            .map(|c| (c.clone(), vec![0.0; days.len()], false))
            .collect();

        for record in records.iter().filter(|r| r.direction == direction) {
            let Some(&idx) = day_index.get(&record.trade_time.date()) else {
                continue;
            };
            if let Some((_, values, seen)) =
                series.iter_mut().find(|(c, _, _)| *c == record.category)
            {
                values[idx] = round2(values[idx] + record.amount);
                *seen = true;
            }
        }

        series
            .into_iter()
            .filter(|(_, _, seen)| *seen)
            .map(|(c, values, _)| (c, values))
            .collect()
    }
}
