//! The bare matrix dialect: `n`, then `n` rows, then the cost.
//!
//! Lines starting with `ERROR` or `TIME_MS` are diagnostics and are skipped.
//! Copies are not printed in this dialect.

use crate::{
    case::Dimensions,
    output::{
        Dialect, ParseFailure, Solution, SolverOutcome, build_graph, matrix_row, parse_number,
    },
};

pub(super) fn parse(text: &str, dims: &Dimensions) -> Result<SolverOutcome, ParseFailure> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| {
            !line.is_empty() && !line.starts_with("ERROR") && !line.starts_with("TIME_MS")
        });

    let (line, content) = lines.next().ok_or(ParseFailure::EmptyOutput)?;
    let order: usize = parse_number(line, content)?;
    if order != dims.target_order {
        return Err(ParseFailure::DimensionMismatch {
            expected: dims.target_order,
            actual: order,
        });
    }

    let mut rows = Vec::with_capacity(order);
    for row in 0..order {
        let (line, content) = lines.next().ok_or(ParseFailure::MissingRows {
            expected: order,
            actual: row,
        })?;
        let entries = matrix_row(line, content)?;
        if entries.len() != order {
            return Err(ParseFailure::RowLength {
                line,
                row,
                expected: order,
                actual: entries.len(),
            });
        }
        rows.push((line, entries));
    }

    let (line, content) = lines.next().ok_or(ParseFailure::MissingSection {
        dialect: Dialect::Compact,
        section: "cost",
    })?;
    let reported_cost: u64 = parse_number(line, content)?;
    if let Some((line, _)) = lines.next() {
        return Err(ParseFailure::TrailingContent { line });
    }

    Ok(SolverOutcome::Found(Solution {
        extended: build_graph(rows)?,
        mappings: None,
        reported_cost,
    }))
}
