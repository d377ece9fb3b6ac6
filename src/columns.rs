//! Column names the pipeline looks for in an upload.
//!
//! Every other column is carried through untouched.

pub const ITEM_PRICE: &str = "Item Price";
pub const QUANTITY: &str = "Quantity";
pub const TOTAL: &str = "Total";
pub const ORDER_DATE: &str = "Order Date";
pub const ORDER_ID: &str = "Order ID";
pub const ITEM_NAME: &str = "Item Name";
pub const BRANCH_NAME: &str = "Branch Name";
pub const ORDER_REGION: &str = "Order Region";
