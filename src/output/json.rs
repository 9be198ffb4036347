//! JSON output for `--json`.

use serde::Serialize;
use std::error::Error;

/// Pretty-print any result type as JSON to stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", to_json(value)?);
    Ok(())
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}
