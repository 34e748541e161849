use crate::error::{BillChartError, Result};
use crate::schema::{Cell, Direction, OrderId, TransactionRecord};
use crate::utils::{parse_datetime_text, round2, serial_to_datetime};
use chrono::NaiveDateTime;
use log::{debug, info, warn};
use uuid::Uuid;

/// Label of the trade-time column; the row holding it is the header.
pub const HEADER_MARKER: &str = "交易时间";
pub const INCOME_LABEL: &str = "收入";
pub const EXPENSE_LABEL: &str = "支出";
pub const SUCCESS_STATUS: &str = "交易成功";
pub const MIN_AMOUNT: f64 = 0.1;

/// Columns of the export, in order.
pub const COLUMN_COUNT: usize = 12;
/// Columns up to and including the trade status; order ids and remark may be cut off.
const REQUIRED_COLUMNS: usize = 9;

/// What to do when no row contains [`HEADER_MARKER`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeaderPolicy {
    /// Fail with [`BillChartError::MissingHeader`].
    #[default]
    Require,
    /// Treat every row as a data row.
    StartAtTop,
}

/// Positional view of one export row.
#[derive(Debug, Clone)]
pub struct RawBillRow {
    pub trade_time: Cell,
    pub category: String,
    pub counterparty: String,
    pub counterparty_account: String,
    pub description: String,
    pub direction: String,
    pub amount: Cell,
    pub payment_method: String,
    pub status: String,
    pub trade_order_id: Cell,
    pub merchant_order_id: Cell,
    pub remark: String,
}

impl RawBillRow {
    /// Destructures a row, or `None` when it is too short to carry the required columns.
    pub fn from_cells(cells: &[Cell]) -> Option<Self> {
        if cells.len() < REQUIRED_COLUMNS {
            return None;
        }

        let mut cells: Vec<Cell> = cells.iter().take(COLUMN_COUNT).map(strip_tabs).collect();
        cells.resize(COLUMN_COUNT, Cell::Empty);
        let text = |i: usize| cells[i].to_text().trim().to_string();
        // Matched exactly against the export's labels, so left untrimmed
        let label = |i: usize| cells[i].to_text();

        Some(Self {
            trade_time: cells[0].clone(),
            category: text(1),
            counterparty: text(2),
            counterparty_account: text(3),
            description: text(4),
            direction: label(5),
            amount: cells[6].clone(),
            payment_method: text(7),
            status: label(8),
            trade_order_id: cells[9].clone(),
            merchant_order_id: cells[10].clone(),
            remark: text(11),
        })
    }
}

fn strip_tabs(cell: &Cell) -> Cell {
    match cell {
        Cell::Text(s) if s.contains('\t') => Cell::Text(s.replace('\t', "")),
        other => other.clone(),
    }
}

fn parse_direction(label: &str) -> Option<Direction> {
    match label {
        INCOME_LABEL => Some(Direction::Income),
        EXPENSE_LABEL => Some(Direction::Expense),
        _ => None,
    }
}

fn parse_amount(cell: &Cell) -> Option<f64> {
    let value = match cell {
        Cell::Number(n) => *n,
        Cell::Text(s) => s
            .trim()
            .trim_start_matches('¥')
            .replace(',', "")
            .parse::<f64>()
            .ok()?,
        Cell::Empty => return None,
    };
    value.is_finite().then_some(value)
}

fn parse_trade_time(cell: &Cell) -> Option<NaiveDateTime> {
    match cell {
        Cell::Text(s) => parse_datetime_text(s),
        Cell::Number(serial) => serial_to_datetime(*serial),
        Cell::Empty => None,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GridParser {
    header_policy: HeaderPolicy,
}

impl GridParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header_policy(mut self, policy: HeaderPolicy) -> Self {
        self.header_policy = policy;
        self
    }

    /// Index of the first data row.
    fn body_start(&self, grid: &[Vec<Cell>]) -> Result<usize> {
        match grid
            .iter()
            .position(|row| row.iter().any(|c| c.is_marker(HEADER_MARKER)))
        {
            Some(header) => Ok(header + 1),
            None => match self.header_policy {
                HeaderPolicy::Require => Err(BillChartError::MissingHeader(
                    HEADER_MARKER.to_string(),
                )),
                HeaderPolicy::StartAtTop => {
                    debug!("Header marker not found, parsing from the first row");
                    Ok(0)
                }
            },
        }
    }

    /// Parses the grid into validated records sorted by trade time.
    ///
    /// Rows that are too short, not income/expense, below the minimum amount or
    /// not successful are skipped without error.
    pub fn parse(&self, grid: &[Vec<Cell>]) -> Result<Vec<TransactionRecord>> {
        let start = self.body_start(grid)?;
        let mut records = Vec::new();
        let mut skipped = 0usize;

        for (offset, cells) in grid[start..].iter().enumerate() {
            let line = start + offset;
            match Self::parse_row(cells) {
                Some(record) => records.push(record),
                None => {
                    debug!("Skipping row {}", line);
                    skipped += 1;
                }
            }
        }

        // Stable, so rows sharing a timestamp keep their export order
        records.sort_by_key(|r| r.trade_time);

        info!(
            "Parsed {} transaction records ({} rows skipped)",
            records.len(),
            skipped
        );

        Ok(records)
    }

    fn parse_row(cells: &[Cell]) -> Option<TransactionRecord> {
        let row = RawBillRow::from_cells(cells)?;

        let raw_amount = parse_amount(&row.amount)?;
        let direction = parse_direction(&row.direction)?;
        if raw_amount < MIN_AMOUNT || row.status != SUCCESS_STATUS {
            return None;
        }
        let amount = round2(raw_amount);

        let Some(trade_time) = parse_trade_time(&row.trade_time) else {
            warn!(
                "Unreadable trade time {:?} on an otherwise valid row",
                row.trade_time
            );
            return None;
        };

        Some(TransactionRecord {
            id: Uuid::new_v4(),
            trade_time,
            category: row.category,
            counterparty: row.counterparty,
            counterparty_account: row.counterparty_account,
            description: row.description,
            direction,
            amount,
            payment_method: row.payment_method,
            status: row.status,
            trade_order_id: OrderId::from_cell(&row.trade_order_id),
            merchant_order_id: OrderId::from_cell(&row.merchant_order_id),
            remark: row.remark,
        })
    }
}

pub fn parse_bill_grid(grid: &[Vec<Cell>]) -> Result<Vec<TransactionRecord>> {
    GridParser::new().parse(grid)
}
