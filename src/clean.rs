//! Cleaning and derivation pipeline.
//!
//! [`Cleaner::clean`] turns a [`RawTable`] into a [`CleanTable`] by running
//! four steps, always in this order:
//!
//! 1. drop rows identical to an earlier row (first occurrence wins),
//! 2. replace every missing cell with the policy fill value,
//! 3. coerce `Item Price` and `Quantity` to numbers and derive `Total`,
//! 4. coerce `Order Date` to a timestamp.
//!
//! Steps 3 and 4 only run when their columns exist. Nothing here fails: a
//! value that cannot be coerced falls back to the [`MissingValuePolicy`].

use std::collections::HashSet;

use log::{debug, warn};

use crate::{
    columns,
    data::{Cell, parse_number, parse_timestamp},
    frame::{CleanTable, RawTable, Table},
};

/// Defaults applied when a cell is missing or cannot be read as a number.
///
/// The fill value is used for every column regardless of its contents, so a
/// missing `Branch Name` becomes the number `0`.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingValuePolicy {
    pub fill: Cell,
    pub numeric_fallback: f64,
}

impl Default for MissingValuePolicy {
    fn default() -> Self {
        Self {
            fill: Cell::Number(0.0),
            numeric_fallback: 0.0,
        }
    }
}

impl MissingValuePolicy {
    pub fn is_missing(&self, cell: &Cell) -> bool {
        cell.is_empty()
    }

    pub fn coerce_number(&self, cell: &Cell) -> f64 {
        match cell {
            Cell::Number(n) if n.is_finite() => *n,
            Cell::Text(s) => parse_number(s).unwrap_or(self.numeric_fallback),
            _ => self.numeric_fallback,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Cleaner {
    policy: MissingValuePolicy,
}

impl Cleaner {
    pub fn new(policy: MissingValuePolicy) -> Self {
        Self { policy }
    }

    pub fn clean(&self, raw: &RawTable) -> CleanTable {
        let mut table = raw.table().clone();

        let removed = drop_duplicate_rows(&mut table);
        debug!("Removed {removed} duplicate row(s)");

        let filled = self.fill_missing(&mut table);
        debug!("Filled {filled} missing cell(s)");

        if self.derive_total(&mut table) {
            debug!(
                "Derived '{}' from '{}' and '{}'",
                columns::TOTAL,
                columns::ITEM_PRICE,
                columns::QUANTITY
            );
        }

        if let Some(unparsed) = coerce_order_dates(&mut table)
            && unparsed > 0
        {
            warn!(
                "{unparsed} value(s) in '{}' could not be read as dates",
                columns::ORDER_DATE
            );
        }

        CleanTable::from_table(table)
    }

    fn fill_missing(&self, table: &mut Table) -> usize {
        let mut filled = 0usize;
        for column in table.columns_mut() {
            for cell in column.values_mut().iter_mut() {
                if self.policy.is_missing(cell) {
                    *cell = self.policy.fill.clone();
                    filled += 1;
                }
            }
        }
        filled
    }

    fn derive_total(&self, table: &mut Table) -> bool {
        let (Some(price_idx), Some(quantity_idx)) = (
            table.column_index(columns::ITEM_PRICE),
            table.column_index(columns::QUANTITY),
        ) else {
            return false;
        };
        let prices = self.coerce_column(table, price_idx);
        let quantities = self.coerce_column(table, quantity_idx);
        let totals = prices
            .iter()
            .zip(&quantities)
            .map(|(price, quantity)| Cell::Number(price * quantity))
            .collect();
        *table.column_at_mut(price_idx).values_mut() =
            prices.into_iter().map(Cell::Number).collect();
        *table.column_at_mut(quantity_idx).values_mut() =
            quantities.into_iter().map(Cell::Number).collect();
        table.set_column(columns::TOTAL, totals);
        true
    }

    fn coerce_column(&self, table: &Table, index: usize) -> Vec<f64> {
        table.columns()[index]
            .values()
            .iter()
            .map(|cell| self.policy.coerce_number(cell))
            .collect()
    }
}

/// Runs the pipeline with the default [`MissingValuePolicy`].
pub fn clean(raw: &RawTable) -> CleanTable {
    Cleaner::default().clean(raw)
}

/// Returns the number of rows removed.
pub fn drop_duplicate_rows(table: &mut Table) -> usize {
    let mut seen = HashSet::with_capacity(table.row_count());
    let keep = (0..table.row_count())
        .map(|row| seen.insert(table.row_key(row)))
        .collect::<Vec<_>>();
    let removed = keep.iter().filter(|kept| !**kept).count();
    if removed > 0 {
        table.retain_rows(&keep);
    }
    removed
}

/// Returns how many values became the null date marker, or `None` when the
/// table has no `Order Date` column.
fn coerce_order_dates(table: &mut Table) -> Option<usize> {
    let index = table.column_index(columns::ORDER_DATE)?;
    let mut unparsed = 0usize;
    for cell in table.column_at_mut(index).values_mut().iter_mut() {
        let parsed = match cell {
            Cell::DateTime(dt) => *dt,
            Cell::Text(s) => parse_timestamp(s),
            _ => None,
        };
        if parsed.is_none() {
            unparsed += 1;
        }
        *cell = Cell::DateTime(parsed);
    }
    Some(unparsed)
}
