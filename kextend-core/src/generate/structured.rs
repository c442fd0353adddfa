//! Hand-designed case families.
//!
//! * `tricky`: small traps for directionality, packing, symmetry, weights
//!   and self-loops, plus the pigeonhole instance that has no answer.
//! * `valid`: solvable shapes around the copy-count boundaries and common
//!   graph classes.
//! * `nightmare`: larger instances meant to stress exact search, drawn from
//!   the caller's RNG.

use std::fmt;

use rand::{Rng, distributions::Standard, rngs::SmallRng, seq::SliceRandom};

use crate::{
    generate::{GenerateError, GeneratedCase},
    graph::Graph,
};

/// A named family of structured cases.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Family {
    /// Small adversarial instances with known answers.
    Tricky,
    /// Solvable instances around the copy-count boundaries.
    Valid,
    /// Larger randomised instances for stress testing.
    Nightmare,
}

impl Family {
    /// Returns every family in generation order.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::Tricky, Self::Valid, Self::Nightmare]
    }

    /// Stable lowercase name, used as the case source.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tricky => "tricky",
            Self::Valid => "valid",
            Self::Nightmare => "nightmare",
        }
    }

    /// Generates every case in the family. Only `nightmare` draws from
    /// `rng`.
    ///
    /// # Errors
    /// Returns [`GenerateError`] if a built instance fails validation.
    pub fn generate(self, rng: &mut SmallRng) -> Result<Vec<GeneratedCase>, GenerateError> {
        match self {
            Self::Tricky => tricky(),
            Self::Valid => valid(),
            Self::Nightmare => nightmare(rng),
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn clique(order: usize) -> Graph {
    Graph::from_fn(order, |u, v| u32::from(u != v))
}

fn directed_path(order: usize) -> Graph {
    Graph::from_fn(order, |u, v| u32::from(v == u + 1))
}

fn undirected(order: usize, edges: &[(usize, usize)]) -> Graph {
    Graph::from_fn(order, |u, v| {
        u32::from(edges.iter().any(|&(a, b)| (a, b) == (u, v) || (b, a) == (u, v)))
    })
}

fn single_edge(weight: u32) -> Graph {
    Graph::from_fn(2, |u, v| if (u, v) == (0, 1) { weight } else { 0 })
}

fn tricky() -> Result<Vec<GeneratedCase>, GenerateError> {
    let source = Family::Tricky.as_str();
    let case = |name: &str, pattern, target, copies| {
        GeneratedCase::new(format!("tricky_{name}"), source, pattern, target, copies)
    };
    [
        case(
            "01_direction",
            single_edge(1),
            Graph::from_fn(2, |u, v| u32::from((u, v) == (1, 0))),
            1,
        ),
        case("02_tetrahedron", clique(3), clique(4), 4),
        case(
            "03_disconnected",
            undirected(4, &[(0, 1), (2, 3)]),
            undirected(5, &[(0, 1), (1, 2), (2, 3), (3, 4)]),
            1,
        ),
        case(
            "04_high_weights",
            single_edge(100),
            single_edge(99),
            1,
        ),
        case(
            "05_symmetry_c4",
            undirected(3, &[(0, 1), (1, 2)]),
            undirected(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]),
            4,
        ),
        case("06_isolated_in_k3", Graph::empty(3), clique(3), 1),
        case("07_k3_in_empty", clique(3), Graph::empty(3), 1),
        case(
            "08_self_loop",
            Graph::from_fn(1, |_, _| 1),
            Graph::empty(1),
            1,
        ),
        case("09_pigeonhole", clique(3), clique(4), 5),
        case("10_sparse_paths", directed_path(5), directed_path(10), 2),
    ]
    .into_iter()
    .collect()
}

fn valid() -> Result<Vec<GeneratedCase>, GenerateError> {
    let source = Family::Valid.as_str();
    let case = |name: &str, pattern, target, copies| {
        GeneratedCase::new(format!("valid_{name}"), source, pattern, target, copies)
    };
    let asymmetric = Graph::from_fn(3, |u, v| match (u, v) {
        (0, 1) => 2,
        (1, 2) => 1,
        (2, 0) => 3,
        _ => 0,
    });
    let star = Graph::from_fn(4, |u, v| if u == 0 && v > 0 { v as u32 } else { 0 });
    let identical = Graph::from_fn(4, |u, v| ((u * 3 + v) % 4) as u32);
    [
        case("boundary_k_min", directed_path(3), directed_path(6), 1),
        case("boundary_k_times_n1_eq_n2", single_edge(1), Graph::empty(10), 5),
        // Copies need distinct vertex sets, not disjoint ones.
        case("boundary_k_times_n1_over_n2", single_edge(1), Graph::empty(9), 5),
        case(
            "selfloops_only",
            Graph::from_fn(3, |u, v| u32::from(u == v)),
            Graph::empty(9),
            3,
        ),
        case(
            "high_multiplicity",
            single_edge(5),
            Graph::from_fn(6, |u, v| u32::from(u != v) * 2),
            3,
        ),
        case("asymmetric_directed", asymmetric, clique(5), 2),
        case("star_multiplicity", star, clique(7), 2),
        case("clique_symmetry", clique(3), clique(5), 3),
        case("identical_graphs", identical.clone(), identical, 1),
        case("large_k", single_edge(1), directed_path(8), 10),
    ]
    .into_iter()
    .collect()
}

fn nightmare(rng: &mut SmallRng) -> Result<Vec<GeneratedCase>, GenerateError> {
    let source = Family::Nightmare.as_str();
    let mut cases = Vec::new();

    for i in 1..=3 {
        let full = |n| Graph::from_fn(n, |_, _| 1);
        cases.push(GeneratedCase::new(
            format!("nightmare_symmetry_clique_{i}"),
            source,
            full(3),
            full(5 + i),
            5 * i,
        )?);
    }

    for i in 1..=3 {
        let (n1, n2) = (5, 12);
        let mut hidden: Vec<usize> = (0..n2).collect();
        hidden.shuffle(rng);
        let hidden_path: Vec<(usize, usize)> = hidden
            .windows(2)
            .take(n1 - 1)
            .filter_map(|pair| match *pair {
                [u, v] => Some((u, v)),
                _ => None,
            })
            .collect();
        // Weight-9 noise everywhere, with one weight-10 path hidden inside.
        let target = Graph::from_fn(n2, |u, v| {
            let draw: f64 = rng.sample(Standard);
            if hidden_path.contains(&(u, v)) {
                10
            } else if u != v && draw < 0.6 {
                9
            } else {
                0
            }
        });
        cases.push(GeneratedCase::new(
            format!("nightmare_backtrack_weights_{i}"),
            source,
            Graph::from_fn(n1, |u, v| if v == u + 1 { 10 } else { 0 }),
            target,
            2,
        )?);
    }

    for i in 1..=2 {
        let target = Graph::from_fn(10, |u, v| {
            let draw: f64 = rng.sample(Standard);
            u32::from(u != v && draw < 0.3)
        });
        let copies = usize::try_from(target.size() / 3).unwrap_or(1).max(1);
        cases.push(GeneratedCase::new(
            format!("nightmare_max_k_{i}"),
            source,
            single_edge(1),
            target,
            copies,
        )?);
    }

    for i in 1..=3 {
        let mut coin = |_: usize, _: usize| rng.gen_range(0..=1_u32);
        let pattern = Graph::from_fn(7, &mut coin);
        let target = Graph::from_fn(15, &mut coin);
        cases.push(GeneratedCase::new(
            format!("nightmare_scale_{i}"),
            source,
            pattern,
            target,
            2,
        )?);
    }

    for i in 1..=2 {
        cases.push(GeneratedCase::new(
            format!("nightmare_loops_{i}"),
            source,
            Graph::from_fn(4, |u, v| if u == v { 5 } else { 0 }),
            Graph::empty(8),
            3,
        )?);
    }

    Ok(cases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rstest::rstest;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn generate(family: Family) -> Result<Vec<GeneratedCase>, GenerateError> {
        family.generate(&mut SmallRng::seed_from_u64(7))
    }

    #[rstest]
    #[case::tricky(Family::Tricky, 10)]
    #[case::valid(Family::Valid, 10)]
    #[case::nightmare(Family::Nightmare, 13)]
    fn families_have_unique_names(#[case] family: Family, #[case] expected: usize) -> TestResult {
        let cases = generate(family)?;
        assert_eq!(cases.len(), expected);
        let mut names: Vec<_> = cases.iter().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), expected);
        assert!(cases.iter().all(|c| c.source == family.as_str()));
        Ok(())
    }

    #[test]
    fn only_the_pigeonhole_case_is_impossible() -> TestResult {
        let impossible: Vec<String> = Family::all()
            .into_iter()
            .map(generate)
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .flatten()
            .filter(|c| c.case.is_impossible())
            .map(|c| c.name)
            .collect();
        assert_eq!(impossible, ["tricky_09_pigeonhole"]);
        Ok(())
    }

    #[test]
    fn boundary_over_n2_is_still_satisfiable() -> TestResult {
        let cases = generate(Family::Valid)?;
        let over = cases
            .iter()
            .find(|c| c.name == "valid_boundary_k_times_n1_over_n2")
            .ok_or("boundary case missing")?;
        let dims = over.case.dimensions();
        assert!(dims.copies * dims.pattern_order > dims.target_order);
        assert!(!over.case.is_impossible());
        Ok(())
    }

    #[test]
    fn nightmare_is_reproducible_from_the_rng() -> TestResult {
        assert_eq!(generate(Family::Nightmare)?, generate(Family::Nightmare)?);
        Ok(())
    }
}
