//! Chart requests.
//!
//! A [`ChartSpec`] names what to plot; drawing it is left to whatever
//! renderer consumes the JSON produced by the `chart` subcommand.

use std::collections::HashMap;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{
    clean::MissingValuePolicy,
    data::{Cell, CellKey},
    error::{InsightsError, Result},
    frame::CleanTable,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    /// Horizontal axis for line and bar charts, slice labels for pie charts.
    pub x: String,
    /// Vertical axis for line and bar charts, slice sizes for pie charts.
    pub y: String,
    pub title: String,
}

impl ChartSpec {
    /// Checks both columns against the table schema. Column types are not
    /// checked.
    pub fn build(kind: ChartKind, x: &str, y: &str, table: &CleanTable) -> Result<Self> {
        for column in [x, y] {
            if !table.has_column(column) {
                return Err(InsightsError::UnknownColumn(column.to_string()));
            }
        }
        let title = match kind {
            ChartKind::Line => format!("Line Chart: {y} over {x}"),
            ChartKind::Bar => format!("Bar Chart: {y} by {x}"),
            ChartKind::Pie => format!("Pie Chart: {y} distribution by {x}"),
        };
        Ok(Self {
            kind,
            x: x.to_string(),
            y: y.to_string(),
            title,
        })
    }

    /// Pulls the referenced values out of `table` for a renderer.
    pub fn resolve(&self, table: &CleanTable) -> Result<ChartData> {
        let xs = table
            .column(&self.x)
            .ok_or_else(|| InsightsError::UnknownColumn(self.x.clone()))?;
        let ys = table
            .column(&self.y)
            .ok_or_else(|| InsightsError::UnknownColumn(self.y.clone()))?;

        match self.kind {
            ChartKind::Line | ChartKind::Bar => Ok(ChartData::Points {
                points: xs
                    .values()
                    .iter()
                    .zip(ys.values())
                    .map(|(x, y)| ChartPoint {
                        x: x.clone(),
                        y: y.clone(),
                    })
                    .collect(),
            }),
            ChartKind::Pie => {
                let policy = MissingValuePolicy::default();
                let mut positions: HashMap<CellKey, usize> = HashMap::new();
                let mut slices: Vec<PieSlice> = Vec::new();
                for (label, value) in xs.values().iter().zip(ys.values()) {
                    let slot = *positions.entry(label.key()).or_insert_with(|| {
                        slices.push(PieSlice {
                            label: label.as_display(),
                            value: 0.0,
                        });
                        slices.len() - 1
                    });
                    slices[slot].value += policy.coerce_number(value);
                }
                Ok(ChartData::Slices { slices })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: Cell,
    pub y: Cell,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChartData {
    Points { points: Vec<ChartPoint> },
    Slices { slices: Vec<PieSlice> },
}
