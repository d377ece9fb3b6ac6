//! Business metrics over a cleaned table.
//!
//! Every function is a pure read and reports an absent column as
//! [`InsightsError::MissingColumn`] instead of defaulting to zero.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap, HashSet},
};

use chrono::Datelike;
use serde::Serialize;

use crate::{
    columns,
    data::{Cell, CellKey},
    error::{InsightsError, Result},
    frame::CleanTable,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub key: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotal {
    /// `YYYY-MM`
    pub month: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub total_sales: f64,
    pub order_count: usize,
    pub top_item: GroupTotal,
    pub top_branch: GroupTotal,
    pub top_region: GroupTotal,
    pub average_order_value: f64,
    pub monthly_sales: Vec<MonthlyTotal>,
}

impl SummaryMetrics {
    pub fn compute(table: &CleanTable) -> Result<Self> {
        Ok(Self {
            total_sales: total_sales(table)?,
            order_count: order_count(table)?,
            top_item: top_item(table)?,
            top_branch: top_branch(table)?,
            top_region: top_region(table)?,
            average_order_value: average_order_value(table)?,
            monthly_sales: monthly_sales(table)?,
        })
    }
}

fn row_totals(table: &CleanTable) -> Result<Vec<f64>> {
    let column = table.require_column(columns::TOTAL)?;
    Ok(column
        .values()
        .iter()
        .map(|cell| cell.as_number().unwrap_or(0.0))
        .collect())
}

/// Sum of `Total`; zero when the table has no rows.
pub fn total_sales(table: &CleanTable) -> Result<f64> {
    Ok(row_totals(table)?.iter().sum())
}

/// Number of distinct `Order ID` values.
pub fn order_count(table: &CleanTable) -> Result<usize> {
    let column = table.require_column(columns::ORDER_ID)?;
    Ok(column
        .values()
        .iter()
        .map(Cell::key)
        .collect::<HashSet<_>>()
        .len())
}

/// Groups rows by `column`, sums `Total` per group and returns the group with
/// the largest sum.
///
/// Groups are ranked in sorted key order (numbers, then text, then dates),
/// so on a tie the smallest key wins.
pub fn top_group(table: &CleanTable, column: &str) -> Result<GroupTotal> {
    let keys = table.require_column(column)?;
    let totals = row_totals(table)?;
    if table.is_empty() {
        return Err(InsightsError::PreconditionFailed(format!(
            "cannot rank '{column}' groups of a table with no rows"
        )));
    }

    let mut positions: HashMap<CellKey, usize> = HashMap::new();
    let mut groups: Vec<(&Cell, f64)> = Vec::new();
    for (cell, total) in keys.values().iter().zip(totals) {
        let slot = *positions.entry(cell.key()).or_insert_with(|| {
            groups.push((cell, 0.0));
            groups.len() - 1
        });
        groups[slot].1 += total;
    }
    groups.sort_by(|(a, _), (b, _)| key_order(a, b));

    let mut best: Option<(&Cell, f64)> = None;
    for group in groups {
        if best.is_none_or(|(_, current)| group.1 > current) {
            best = Some(group);
        }
    }
    best.map(|(cell, total)| GroupTotal {
        key: cell.as_display(),
        total,
    })
    .ok_or_else(|| InsightsError::PreconditionFailed(format!("no '{column}' groups to rank")))
}

fn key_order(a: &Cell, b: &Cell) -> Ordering {
    fn rank(cell: &Cell) -> u8 {
        match cell {
            Cell::Number(_) => 0,
            Cell::Text(_) => 1,
            Cell::DateTime(Some(_)) => 2,
            Cell::DateTime(None) => 3,
            Cell::Empty => 4,
        }
    }
    match (a, b) {
        (Cell::Number(x), Cell::Number(y)) => x.total_cmp(y),
        (Cell::Text(x), Cell::Text(y)) => x.cmp(y),
        (Cell::DateTime(Some(x)), Cell::DateTime(Some(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

pub fn top_item(table: &CleanTable) -> Result<GroupTotal> {
    top_group(table, columns::ITEM_NAME)
}

pub fn top_branch(table: &CleanTable) -> Result<GroupTotal> {
    top_group(table, columns::BRANCH_NAME)
}

pub fn top_region(table: &CleanTable) -> Result<GroupTotal> {
    top_group(table, columns::ORDER_REGION)
}

pub fn average_order_value(table: &CleanTable) -> Result<f64> {
    let sales = total_sales(table)?;
    let orders = order_count(table)?;
    if orders == 0 {
        return Err(InsightsError::DivisionByZero(format!(
            "average order value needs at least one '{}'",
            columns::ORDER_ID
        )));
    }
    Ok(sales / orders as f64)
}

/// Sum of `Total` per calendar month of `Order Date`, oldest month first.
/// Rows whose date could not be read are left out.
pub fn monthly_sales(table: &CleanTable) -> Result<Vec<MonthlyTotal>> {
    let dates = table.require_column(columns::ORDER_DATE)?;
    let totals = row_totals(table)?;
    let mut months: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for (cell, total) in dates.values().iter().zip(totals) {
        if let Some(date) = cell.as_datetime() {
            *months.entry((date.year(), date.month())).or_insert(0.0) += total;
        }
    }
    Ok(months
        .into_iter()
        .map(|((year, month), total)| MonthlyTotal {
            month: format!("{year:04}-{month:02}"),
            total,
        })
        .collect())
}
