//! Reply formatting.

use anyhow::Result;
use colored::Colorize;
use rosapi::{Error, Response, Status};

use crate::OutputFormat;

/// Prints a command reply in the requested format.
pub fn print_reply(rows: &[Response], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows)?),
        OutputFormat::Table => {
            for row in rows.iter().filter(|r| is_visible(r)) {
                println!("{}", format_row(row));
            }
        }
    }
    Ok(())
}

/// Prints a failed command. Device errors keep their `!trap` shape.
pub fn print_error(err: &Error) {
    eprintln!("{}", format_error(err));
}

/// `!trap details` for device errors, `error: ...` otherwise.
fn format_error(err: &Error) -> String {
    match err {
        Error::Api { kind, details } => {
            format!("!{} {}", kind.to_string().bold().red(), details.join(" "))
        }
        other => format!("{} {other}", "error:".bold().red()),
    }
}

/// A bare `!done` carries nothing worth showing.
fn is_visible(row: &Response) -> bool {
    row.status != Status::Done || !row.attributes.is_empty()
}

/// `!status key=value ... details`, colorized.
fn format_row(row: &Response) -> String {
    let mut out = format!("!{}", row.status.as_str().bold().magenta());
    for (k, v) in &row.attributes {
        out.push(' ');
        out.push_str(&format!("{}={}", k.blue(), v.green()));
    }
    if !row.error.is_empty() {
        out.push(' ');
        out.push_str(&row.error.join(" "));
    }
    out
}
