//! # Bill Sunburst
//!
//! A library for turning a personal bill export (a 2-D grid of cells) into the
//! layout data of a three-ring polar income/expense chart.
//!
//! ## Core Concepts
//!
//! - **Records**: validated, timestamp-sorted transactions parsed from the raw grid
//! - **Periods**: calendar months the records are bucketed into
//! - **Deltas**: per-category period-over-period swings with small swings suppressed
//! - **Rings**: inner (top categories and their swing), trend (daily stacked
//!   totals) and scatter (one point per transaction), each split into an income
//!   and an expense half
//! - **Descriptors**: renderer-ready JSON fragments that merge by concatenation
//!
//! ## Example
//!
//! ```rust,ignore
//! use bill_sunburst::*;
//!
//! let grid: Vec<Vec<Cell>> = vec![
//!     vec!["交易时间".into(), "交易分类".into(), "交易对方".into(), "对方账号".into(),
//!          "商品说明".into(), "收/支".into(), "金额".into(), "收/付款方式".into(),
//!          "交易状态".into(), "交易订单号".into(), "商家订单号".into(), "备注".into()],
//!     vec!["2024-05-02 12:00:00".into(), "餐饮".into(), "美团".into(), "".into(),
//!          "午饭".into(), "支出".into(), 32.5.into(), "支付宝".into(),
//!          "交易成功".into(), "".into(), "".into(), "".into()],
//! ];
//!
//! let settings = ChartSettings::default();
//! let stats = process_bill_data(&grid, &settings).unwrap();
//! let chart = BillChart::new(settings).unwrap();
//! let option = chart
//!     .option_for_period(&stats, PeriodKey::new(2024, 5).unwrap())
//!     .unwrap();
//! println!("{}", option.to_json_string().unwrap());
//! ```

pub mod descriptor;
pub mod engine;
pub mod error;
pub mod ingestion;
pub mod layout;
pub mod mock;
pub mod scale;
pub mod schema;
pub mod utils;

pub use descriptor::{merge, merge_all, ChartDescriptor};
pub use engine::{Aggregator, PeriodDeltas, PeriodGroups};
pub use error::{BillChartError, Result};
pub use ingestion::*;
pub use layout::{LayoutBuilder, RecordIndex, Ring, ScatterAxes, TooltipDetail};
pub use mock::{generate_mock_grid, generate_recent_grid};
pub use scale::{nice_number, AxisScaler, NiceScale};
pub use schema::*;
pub use utils::*;

use log::{debug, info};

/// Everything derived from one export, independent of the period on screen.
#[derive(Debug, Clone)]
pub struct BillStatistics {
    pub records: Vec<TransactionRecord>,
    pub periods: PeriodGroups,
    pub category_rank: CategoryRank,
    pub color_map: ColorMap,
    pub category_deltas: PeriodDeltas,
    /// Range of individual transaction amounts.
    pub trade_min_max: TradeMinMax,
    /// Range of per-category monthly totals.
    pub category_total_min_max: TradeMinMax,
}

impl BillStatistics {
    /// Periods with at least one record, oldest first.
    pub fn period_keys(&self) -> Vec<PeriodKey> {
        self.periods.keys().copied().collect()
    }

    pub fn latest_period(&self) -> Option<PeriodKey> {
        self.periods.keys().next_back().copied()
    }

    pub fn record_index(&self) -> RecordIndex<'_> {
        RecordIndex::new(&self.records)
    }
}

pub struct BillChartProcessor;

impl BillChartProcessor {
    pub fn process(grid: &[Vec<Cell>], settings: &ChartSettings) -> Result<BillStatistics> {
        Self::process_with(grid, &GridParser::new(), settings, None)
    }

    /// Like [`process`](Self::process), with an explicit parser and an optional
    /// allow-list of periods; records outside it are not grouped.
    pub fn process_with(
        grid: &[Vec<Cell>],
        parser: &GridParser,
        settings: &ChartSettings,
        periods: Option<&[PeriodKey]>,
    ) -> Result<BillStatistics> {
        settings.validate()?;

        let records = parser.parse(grid)?;
        let aggregator = Aggregator::new(settings.delta_thresholds.clone());

        let category_rank = aggregator.rank_categories(&records);
        let color_map = aggregator.assign_colors(&category_rank, &settings.palette);
        let groups = aggregator.group_by_period(&records, periods);
        let category_deltas = aggregator.category_deltas(&groups, &category_rank);
        let trade_min_max = aggregator.trade_min_max(&records);
        let category_total_min_max = aggregator.category_total_min_max(&groups, &category_rank);

        info!(
            "Processed {} records into {} periods",
            records.len(),
            groups.len()
        );
        debug!(
            "Ranked {} income and {} expense categories",
            category_rank.income.len(),
            category_rank.expense.len()
        );

        Ok(BillStatistics {
            records,
            periods: groups,
            category_rank,
            color_map,
            category_deltas,
            trade_min_max,
            category_total_min_max,
        })
    }
}

pub fn process_bill_data(grid: &[Vec<Cell>], settings: &ChartSettings) -> Result<BillStatistics> {
    BillChartProcessor::process(grid, settings)
}

/// Largest per-day sum over stacked daily series.
fn stacked_peak(series: &[(String, Vec<f64>)]) -> Option<MinMax> {
    let days = series.iter().map(|(_, values)| values.len()).max()?;
    let sums = (0..days).map(|day| {
        round2(
            series
                .iter()
                .filter_map(|(_, values)| values.get(day))
                .sum::<f64>(),
        )
    });
    MinMax::from_values(sums)
}

/// Composes the six ring halves of one period into a single descriptor.
#[derive(Debug, Default)]
pub struct BillChart {
    builder: LayoutBuilder,
    aggregator: Aggregator,
}

impl BillChart {
    pub fn new(settings: ChartSettings) -> Result<Self> {
        let aggregator = Aggregator::new(settings.delta_thresholds.clone());
        Ok(Self {
            builder: LayoutBuilder::new(settings)?,
            aggregator,
        })
    }

    pub fn builder(&self) -> &LayoutBuilder {
        &self.builder
    }

    /// `[0, nice max]` of a range, `[0, 1]` without data.
    fn zero_based_extent(&self, range: Option<MinMax>) -> [f64; 2] {
        match range {
            Some(range) => self.builder.scaler().extent(MinMax {
                min: 0.0,
                max: range.max,
            }),
            None => [0.0, 1.0],
        }
    }

    /// The full chart of `period`, or an empty descriptor when the period has
    /// no records.
    ///
    /// Halves are merged as inner, trend, scatter with income before expense,
    /// so polar region `i` of the result is the one with `polarIndex == i`.
    /// A half without data contributes its bare scaffold.
    pub fn option_for_period(
        &self,
        stats: &BillStatistics,
        period: PeriodKey,
    ) -> Result<ChartDescriptor> {
        let Some(records) = stats.periods.get(&period).filter(|r| !r.is_empty()) else {
            debug!("No records for period {}", period);
            return Ok(ChartDescriptor::empty());
        };

        let deltas = stats
            .category_deltas
            .get(&period)
            .cloned()
            .unwrap_or_default();
        let days = period.days()?;
        let colors = &stats.color_map;

        let shared_total = match (
            stats.category_total_min_max.income,
            stats.category_total_min_max.expense,
        ) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (a, b) => a.or(b),
        };
        let inner_extent = self.zero_based_extent(shared_total);

        let mut fragments = Vec::with_capacity(6);
        for direction in Direction::ALL {
            fragments.push((
                Ring::Inner,
                direction,
                self.builder
                    .inner_ring(direction, deltas.get(direction), inner_extent, colors),
            ));
        }
        for direction in Direction::ALL {
            let series = self.aggregator.daily_category_series(
                records,
                direction,
                stats.category_rank.get(direction),
                &days,
            );
            // Series are stacked, so a single day may exceed any one category total
            let totals = *stats.category_total_min_max.get(direction);
            let range = match (totals, stacked_peak(&series)) {
                (Some(totals), Some(peak)) => Some(totals.union(peak)),
                (totals, peak) => totals.or(peak),
            };
            let extent = self.zero_based_extent(range);
            fragments.push((
                Ring::Trend,
                direction,
                self.builder
                    .trend_ring(direction, &days, &series, extent, colors),
            ));
        }
        for direction in Direction::ALL {
            let amounts = *stats.trade_min_max.get(direction);
            let fragment = self.builder.scatter_ring(
                direction,
                period,
                records,
                &ScatterAxes {
                    categories: stats.category_rank.get(direction),
                    amount_range: amounts,
                    radius_extent: self.zero_based_extent(amounts),
                },
                colors,
            )?;
            fragments.push((Ring::Scatter, direction, fragment));
        }

        let option = merge_all(fragments.into_iter().map(|(ring, direction, fragment)| {
            if fragment.is_empty() {
                debug!(
                    "No {} data for the {:?} ring in {}",
                    direction.as_str(),
                    ring,
                    period
                );
                self.builder.placeholder(ring, direction)
            } else {
                fragment
            }
        }));

        Ok(option)
    }
}
