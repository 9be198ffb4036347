//! Output formatting for calculator results.
//!
//! This module handles formatting and outputting results:
//! - [`csv`] - CSV output formatting
//! - [`json`] - JSON output
//! - [`terminal`] - Terminal output with colors

mod csv;
mod json;
mod terminal;

pub use csv::{
    allocation_row, cidr_row, meta_rows, overlap_row, print_allocations, print_cidrs,
    print_classes, print_meta, print_overlaps,
};
pub use json::{print_json, to_json};
pub use terminal::format_field;
