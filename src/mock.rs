//! Random export grids for demos and tests.

use crate::ingestion::{EXPENSE_LABEL, HEADER_MARKER, INCOME_LABEL};
use crate::schema::Cell;
use crate::utils::format_datetime;
use chrono::{Duration, Months, NaiveDateTime};
use rand::seq::SliceRandom;
use rand::Rng;

pub const HEADER_ROW: [&str; 12] = [
    HEADER_MARKER,
    "交易分类",
    "交易对方",
    "对方账号",
    "商品说明",
    "收/支",
    "金额",
    "收/付款方式",
    "交易状态",
    "交易订单号",
    "商家订单号",
    "备注",
];

const CATEGORIES: [&str; 7] = ["餐饮", "购物", "交通", "娱乐", "医疗", "教育", "其他"];
const COUNTERPARTIES: [&str; 10] = [
    "张三", "李四", "王五", "淘宝", "京东", "美团", "饿了么", "滴滴", "医院", "学校",
];
const PAYMENT_METHODS: [&str; 5] = ["支付宝", "微信", "银行卡", "信用卡", "现金"];
const STATUSES: [&str; 3] = ["交易成功", "交易失败", "交易处理中"];
const REMARKS: [&str; 6] = ["", "无", "优惠", "退款", "分期", "活动"];
const DESCRIPTIONS: [&str; 7] = ["商品A", "商品B", "服务C", "套餐D", "票务E", "课程F", "药品G"];

pub const DEFAULT_ROW_COUNT: usize = 500;

fn pick<R: Rng + ?Sized>(rng: &mut R, pool: &[&str]) -> Cell {
    Cell::text(pool.choose(rng).copied().unwrap_or_default())
}

fn order_number<R: Rng + ?Sized>(rng: &mut R) -> Cell {
    Cell::text(format!(
        "{:012}{}",
        rng.gen_range(0..1_000_000_000_000u64),
        rng.gen_range(0..1000)
    ))
}

/// A header row followed by `count` rows spread uniformly over `[start, end]`,
/// sorted by trade time. Roughly a third of the rows carry a non-success
/// status and are dropped by the parser.
pub fn generate_mock_grid<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Vec<Vec<Cell>> {
    let span = (end - start).num_seconds().max(0);

    let mut rows: Vec<(NaiveDateTime, Vec<Cell>)> = (0..count)
        .map(|_| {
            let time = start + Duration::seconds(rng.gen_range(0..=span));
            let direction = if rng.gen_bool(0.5) {
                EXPENSE_LABEL
            } else {
                INCOME_LABEL
            };
            let amount = rng.gen_range(100..=100_100u32) as f64 / 100.0;
            let row = vec![
                Cell::text(format_datetime(time)),
                pick(rng, &CATEGORIES),
                pick(rng, &COUNTERPARTIES),
                Cell::text(format!("6222{:012}", rng.gen_range(0..1_000_000_000_000u64))),
                pick(rng, &DESCRIPTIONS),
                Cell::text(direction),
                Cell::text(format!("{:.2}", amount)),
                pick(rng, &PAYMENT_METHODS),
                pick(rng, &STATUSES),
                order_number(rng),
                order_number(rng),
                pick(rng, &REMARKS),
            ];
            (time, row)
        })
        .collect();

    rows.sort_by_key(|(time, _)| *time);

    let mut grid = Vec::with_capacity(count + 1);
    grid.push(HEADER_ROW.iter().map(|h| Cell::text(*h)).collect());
    grid.extend(rows.into_iter().map(|(_, row)| row));
    grid
}

/// [`DEFAULT_ROW_COUNT`] rows over the six months before `now`.
pub fn generate_recent_grid<R: Rng + ?Sized>(rng: &mut R, now: NaiveDateTime) -> Vec<Vec<Cell>> {
    let start = now.checked_sub_months(Months::new(6)).unwrap_or(now);
    generate_mock_grid(rng, DEFAULT_ROW_COUNT, start, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::GridParser;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_grid_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let grid = generate_mock_grid(&mut rng, 40, at(2024, 1, 1), at(2024, 3, 31));
        assert_eq!(grid.len(), 41);
        assert!(grid[0][0].is_marker(HEADER_MARKER));
        assert!(grid.iter().all(|row| row.len() == 12));

        let times: Vec<String> = grid[1..].iter().map(|r| r[0].to_text()).collect();
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted);
        assert!(times.iter().all(|t| t.as_str() >= "2024-01-01" && t.as_str() <= "2024-03-31 00:00:00"));
    }

    #[test]
    fn test_same_seed_same_grid() {
        let a = generate_mock_grid(&mut StdRng::seed_from_u64(1), 10, at(2024, 1, 1), at(2024, 2, 1));
        let b = generate_mock_grid(&mut StdRng::seed_from_u64(1), 10, at(2024, 1, 1), at(2024, 2, 1));
        assert_eq!(a, b);
    }

    #[test]
    fn test_grid_parses() {
        let mut rng = StdRng::seed_from_u64(42);
        let grid = generate_recent_grid(&mut rng, at(2024, 7, 1));
        assert_eq!(grid.len(), DEFAULT_ROW_COUNT + 1);

        let records = GridParser::new().parse(&grid).unwrap();
        assert!(!records.is_empty());
        assert!(records.len() < DEFAULT_ROW_COUNT);
        assert!(records
            .iter()
            .all(|r| r.amount >= 1.0 && r.amount <= 1001.0 && r.counterparty_account.starts_with("6222")));
    }
}
