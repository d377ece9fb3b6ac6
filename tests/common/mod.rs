#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use sales_insights::{
    clean::clean,
    data::Cell,
    frame::{CleanTable, Table},
};
use tempfile::{TempDir, tempdir};

pub const SALES_HEADER: &str =
    "Order ID,Order Date,Item Name,Branch Name,Order Region,Item Price,Quantity";

/// Small export with one exact duplicate row and one missing branch.
pub const SALES_CSV: &str = "\
Order ID,Order Date,Item Name,Branch Name,Order Region,Item Price,Quantity
1001,2024-01-05,Rice,Ikeja,Lagos,2500,2
1002,2024-01-20,Beans,Wuse,Abuja,1200,1
1002,2024-01-20,Garri,Wuse,Abuja,800,3
1003,2024-02-01,Rice,,Lagos,2500,1
1001,2024-01-05,Rice,Ikeja,Lagos,2500,2
";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        self.write_bytes(name, contents.as_bytes())
    }

    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }
}

pub fn text(value: &str) -> Cell {
    Cell::text(value)
}

pub fn num(value: f64) -> Cell {
    Cell::Number(value)
}

/// Cleans a hand-built table.
pub fn clean_rows(headers: &[&str], rows: Vec<Vec<Cell>>) -> CleanTable {
    clean(&Table::from_rows(headers, rows).into())
}
