//! The labelled report dialect.
//!
//! Sections are located by label, in English or Polish:
//!
//! ```text
//! Extension cost: 2
//! Mappings:
//!   Copy 1: 0->1, 1->2
//! Extended graph:
//! 0 1 0
//! ...
//! ```
//!
//! Copy numbers are one-based. Copies missing from the listing stay
//! unassigned and copies past `k` are kept, so both fail verification later
//! rather than parsing. Matrix rows may carry a `[i]` label.

use std::collections::BTreeMap;

use crate::{
    case::Dimensions,
    mapping::Mapping,
    output::{ParseFailure, Solution, SolverOutcome, build_graph, matrix_row, parse_number},
};

use super::Dialect;

pub(super) const COST_LABELS: [&str; 2] = ["Extension cost:", "Koszt rozszerzenia:"];
const MAPPING_LABELS: [&str; 2] = ["Mappings:", "Mapowania:"];
const EXTENDED_LABELS: [&str; 2] = ["Extended graph", "Rozszerzony graf"];
const EXTENDED_SHORT_LABELS: [&str; 2] = ["G'2", "G'_2"];
const COPY_PREFIXES: [&str; 2] = ["copy", "kopia"];

type Line<'a> = (usize, &'a str);

pub(super) fn parse(text: &str, dims: &Dimensions) -> Result<SolverOutcome, ParseFailure> {
    let lines: Vec<Line<'_>> = text
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .collect();
    let reported_cost = read_cost(&lines)?;
    let extended_header = find_extended_header(&lines);
    let mappings = read_mappings(&lines, extended_header, dims)?;
    let header = extended_header.ok_or(ParseFailure::MissingSection {
        dialect: Dialect::Verbose,
        section: "extended graph",
    })?;
    let extended = read_extended(lines.get(header + 1..).unwrap_or_default(), dims)?;
    Ok(SolverOutcome::Found(Solution {
        extended,
        mappings: Some(mappings),
        reported_cost,
    }))
}

fn contains_any(line: &str, labels: &[&str]) -> bool {
    labels.iter().any(|label| line.contains(label))
}

fn read_cost(lines: &[Line<'_>]) -> Result<u64, ParseFailure> {
    let (line, rest) = lines
        .iter()
        .find_map(|&(line, content)| {
            COST_LABELS.iter().find_map(|label| {
                let start = content.find(label)? + label.len();
                Some((line, content.get(start..)?.trim_start()))
            })
        })
        .ok_or(ParseFailure::MissingSection {
            dialect: Dialect::Verbose,
            section: "extension cost",
        })?;
    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    match rest.get(..digits) {
        Some(number) if !number.is_empty() => parse_number(line, number),
        _ => Err(ParseFailure::InvalidInteger {
            line,
            token: rest.to_owned(),
        }),
    }
}

fn find_extended_header(lines: &[Line<'_>]) -> Option<usize> {
    lines
        .iter()
        .position(|(_, content)| contains_any(content, &EXTENDED_LABELS))
        .or_else(|| {
            lines.iter().position(|(_, content)| {
                contains_any(content, &EXTENDED_SHORT_LABELS) && !contains_any(content, &COST_LABELS)
            })
        })
}

/// Splits `Copy 3: 0->1, 1->2` into the copy number and the assignment list.
fn copy_line(content: &str) -> Option<(&str, &str)> {
    let lowered = content.to_ascii_lowercase();
    let prefix = COPY_PREFIXES
        .iter()
        .find(|prefix| lowered.starts_with(**prefix))?;
    let (number, assignments) = content.get(prefix.len()..)?.split_once(':')?;
    let number = number.trim();
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((number, assignments))
}

fn read_mappings(
    lines: &[Line<'_>],
    extended_header: Option<usize>,
    dims: &Dimensions,
) -> Result<Vec<Mapping>, ParseFailure> {
    let header = lines
        .iter()
        .position(|(_, content)| contains_any(content, &MAPPING_LABELS))
        .ok_or(ParseFailure::MissingSection {
            dialect: Dialect::Verbose,
            section: "mappings",
        })?;
    let end = extended_header
        .filter(|&extended| extended > header)
        .unwrap_or(lines.len());

    let mut listed: BTreeMap<usize, Mapping> = BTreeMap::new();
    for &(line, content) in lines.get(header + 1..end).unwrap_or_default() {
        let Some((number, assignments)) = copy_line(content) else {
            continue;
        };
        let copy: usize = parse_number(line, number)?;
        if copy == 0 {
            return Err(ParseFailure::CopyOutOfRange {
                line,
                copy,
                copies: dims.copies,
            });
        }
        if listed.contains_key(&copy) {
            return Err(ParseFailure::DuplicateCopy { line, copy });
        }
        let mut mapping = Mapping::unassigned(dims.pattern_order);
        for pair in assignments.split(|c: char| c == ',' || c.is_whitespace()) {
            let Some((vertex, target)) = pair.split_once("->") else {
                continue;
            };
            let vertex: usize = parse_number(line, vertex)?;
            let target: usize = parse_number(line, target)?;
            if !mapping.set(vertex, target) {
                return Err(ParseFailure::SourceOutOfRange {
                    line,
                    copy,
                    vertex,
                    order: dims.pattern_order,
                });
            }
        }
        listed.insert(copy, mapping);
    }
    Ok(arrange(listed, dims))
}

/// Puts copy `c <= k` at index `c - 1`, leaving gaps unassigned, and appends
/// copies numbered past `k` in order.
fn arrange(listed: BTreeMap<usize, Mapping>, dims: &Dimensions) -> Vec<Mapping> {
    let highest = listed.keys().next_back().copied().unwrap_or_default();
    let slots = highest.min(dims.copies);
    let mut mappings = vec![Mapping::unassigned(dims.pattern_order); slots];
    for (copy, mapping) in listed {
        if copy > slots {
            mappings.push(mapping);
        } else if let Some(slot) = mappings.get_mut(copy - 1) {
            *slot = mapping;
        }
    }
    mappings
}

/// Drops a leading `[i]` row label.
fn strip_row_label(content: &str) -> &str {
    content
        .strip_prefix('[')
        .and_then(|rest| rest.split_once(']'))
        .map_or(content, |(_, row)| row.trim_start())
}

/// Reads the `n2` rows following the header.
///
/// Blank lines are skipped and the matrix ends at the first line that does
/// not start like a row. Each row must consist of integers only.
fn read_extended(lines: &[Line<'_>], dims: &Dimensions) -> Result<crate::Graph, ParseFailure> {
    let order = dims.target_order;
    let mut rows = Vec::with_capacity(order);
    for &(line, content) in lines {
        if rows.len() == order {
            break;
        }
        let in_mappings = copy_line(content).is_some() || contains_any(content, &MAPPING_LABELS);
        if content.is_empty() || in_mappings {
            continue;
        }
        let row = strip_row_label(content);
        if !row.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+') {
            break;
        }
        rows.push((line, matrix_row(line, row)?));
    }
    if rows.len() < order {
        return Err(ParseFailure::MissingRows {
            expected: order,
            actual: rows.len(),
        });
    }
    build_graph(rows)
}
