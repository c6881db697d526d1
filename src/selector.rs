//! Departure selection: line filtering and pairing.
//!
//! Given the countdown-sorted list for a stop, [`select`] decides what a
//! widget shows:
//!
//! ```text
//! departures ──▶ empty? ──yes──▶ Empty
//!                  │
//!                  no
//!                  ▼
//!           line filter ──none kept──▶ NoLineMatch
//!                  │
//!                  ▼
//!        first + (same-line second)? ──▶ Selected
//! ```
//!
//! Selection is pure and never fails. "Nothing to show" is a result, not an
//! error.

use crate::departure::Departure;

/// Departures requested when two-departure mode is on.
pub const FETCH_LIMIT_TWO: usize = 20;
/// Departures requested otherwise.
pub const FETCH_LIMIT_ONE: usize = 10;

/// How many departures to ask the client for.
///
/// Oversampled so a line filter still has something to match against.
pub fn fetch_limit(show_two_departures: bool) -> usize {
    if show_two_departures {
        FETCH_LIMIT_TWO
    } else {
        FETCH_LIMIT_ONE
    }
}

/// Normalized set of line codes to keep.
///
/// # Example
///
/// ```rust
/// use rs_departures::LineFilter;
///
/// let filter = LineFilter::parse(" u1, 26a ,,").unwrap();
/// assert!(filter.matches("U1"));
/// assert!(filter.matches("26a"));
/// assert!(!filter.matches("U6"));
///
/// assert!(LineFilter::parse(" , ").is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineFilter {
    tokens: Vec<String>,
}

impl LineFilter {
    /// Parses a comma-separated list.
    ///
    /// Tokens are trimmed and upper-cased; empty ones are dropped. Returns
    /// `None` if nothing is left, which callers treat as "no filter".
    pub fn parse(raw: &str) -> Option<Self> {
        let tokens: Vec<String> = raw
            .split(',')
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.is_empty() {
            None
        } else {
            Some(Self { tokens })
        }
    }

    /// Case-insensitive exact match on the line code.
    pub fn matches(&self, line: &str) -> bool {
        let line = line.to_uppercase();
        self.tokens.iter().any(|t| *t == line)
    }
}

/// Selection parameters for one widget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionConfig {
    /// Lines to keep, `None` keeps everything
    pub line_filter: Option<LineFilter>,
    /// Look for a second departure of the same line
    pub show_two_departures: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            line_filter: None,
            show_two_departures: true,
        }
    }
}

/// Outcome of [`select`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionResult {
    /// The stop has no departures at all.
    Empty,
    /// Departures exist but none match the line filter.
    NoLineMatch,
    /// Something to show.
    Selected {
        /// Earliest remaining departure.
        first: Departure,
        /// Next departure of the same line, two-departure mode only.
        second: Option<Departure>,
    },
}

/// Picks what to display from a countdown-sorted list.
///
/// # Example
///
/// ```rust
/// use rs_departures::{select, Departure, SelectionConfig, SelectionResult};
///
/// let departures = vec![
///     Departure::new("U1", "LEOPOLDAU", 1),
///     Departure::new("U4", "HÜTTELDORF", 3),
///     Departure::new("U1", "LEOPOLDAU", 6),
/// ];
/// let result = select(&departures, &SelectionConfig::default());
///
/// match result {
///     SelectionResult::Selected { first, second } => {
///         assert_eq!(first.countdown, 1);
///         assert_eq!(second.map(|d| d.countdown), Some(6));
///     }
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
pub fn select(departures: &[Departure], config: &SelectionConfig) -> SelectionResult {
    if departures.is_empty() {
        return SelectionResult::Empty;
    }

    let kept: Vec<&Departure> = match &config.line_filter {
        Some(filter) => departures.iter().filter(|d| filter.matches(&d.line)).collect(),
        None => departures.iter().collect(),
    };

    let Some((first, rest)) = kept.split_first() else {
        return SelectionResult::NoLineMatch;
    };

    let second = if config.show_two_departures {
        rest.iter().find(|d| d.line == first.line).map(|d| (*d).clone())
    } else {
        None
    };

    SelectionResult::Selected {
        first: (*first).clone(),
        second,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dep(line: &str, countdown: i64) -> Departure {
        Departure::new(line, "KARLSPLATZ", countdown)
    }

    fn only(filter: &str) -> SelectionConfig {
        SelectionConfig {
            line_filter: LineFilter::parse(filter),
            show_two_departures: true,
        }
    }

    #[test]
    fn fetch_limits() {
        assert_eq!(fetch_limit(true), 20);
        assert_eq!(fetch_limit(false), 10);
    }

    #[test]
    fn empty_input() {
        assert_eq!(select(&[], &SelectionConfig::default()), SelectionResult::Empty);
        assert_eq!(select(&[], &only("U1")), SelectionResult::Empty);
    }

    #[test]
    fn filter_without_tokens_is_no_filter() {
        let deps = vec![dep("U6", 2)];
        let result = select(&deps, &only(" , ,"));
        assert!(matches!(result, SelectionResult::Selected { .. }));
    }

    #[test]
    fn filter_drops_everything() {
        let deps = vec![dep("U6", 2), dep("13A", 4)];
        assert_eq!(select(&deps, &only("U1")), SelectionResult::NoLineMatch);
    }

    #[test]
    fn second_must_share_exact_line() {
        let deps = vec![dep("U1", 1), dep("U1E", 2), dep("U2", 3)];
        assert_eq!(
            select(&deps, &SelectionConfig::default()),
            SelectionResult::Selected {
                first: dep("U1", 1),
                second: None,
            }
        );
    }

    #[test]
    fn single_mode_ignores_second() {
        let deps = vec![dep("U1", 1), dep("U1", 5)];
        let config = SelectionConfig {
            line_filter: None,
            show_two_departures: false,
        };
        assert_eq!(
            select(&deps, &config),
            SelectionResult::Selected {
                first: dep("U1", 1),
                second: None,
            }
        );
    }

    #[test]
    fn filter_is_case_insensitive() {
        let deps = vec![dep("u2", 3), dep("U1", 4)];
        match select(&deps, &only("U2")) {
            SelectionResult::Selected { first, .. } => assert_eq!(first.line, "u2"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
