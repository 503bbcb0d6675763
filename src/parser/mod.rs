pub mod detail;
pub mod fields;
pub mod listing;
