// Orderings for task lists

use crate::models::Task;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use tracing::debug;

/// How a list view orders tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
    #[default]
    DateAsc,
    DateDesc,
    PriorityHigh,
    PriorityLow,
    /// Collection order (newest first)
    None,
}

impl SortMode {
    pub const ALL: [SortMode; 5] = [
        SortMode::DateAsc,
        SortMode::DateDesc,
        SortMode::PriorityHigh,
        SortMode::PriorityLow,
        SortMode::None,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::DateAsc => "date-asc",
            SortMode::DateDesc => "date-desc",
            SortMode::PriorityHigh => "priority-high",
            SortMode::PriorityLow => "priority-low",
            SortMode::None => "none",
        }
    }

    /// Map a raw selection to a mode; unknown values keep collection order
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| {
            debug!(value = s, "Unknown sort mode, keeping collection order");
            SortMode::None
        })
    }

    fn compare(self, a: &Task, b: &Task) -> Ordering {
        match self {
            SortMode::DateAsc => compare_due(a, b, false),
            SortMode::DateDesc => compare_due(a, b, true),
            SortMode::PriorityHigh => b.priority.rank().cmp(&a.priority.rank()),
            SortMode::PriorityLow => a.priority.rank().cmp(&b.priority.rank()),
            SortMode::None => Ordering::Equal,
        }
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown sort mode: {} (expected date-asc, date-desc, priority-high, priority-low or none)",
                    s
                )
            })
    }
}

impl std::fmt::Display for SortMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Tasks without a due date go last whichever direction is requested
fn compare_due(a: &Task, b: &Task, descending: bool) -> Ordering {
    match (a.due_date, b.due_date) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) if descending => y.cmp(&x),
        (Some(x), Some(y)) => x.cmp(&y),
    }
}

/// Return a newly ordered copy of `tasks`
///
/// The sort is stable: tasks comparing equal keep their relative order.
pub fn sort_tasks(tasks: &[Task], mode: SortMode) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    if mode != SortMode::None {
        sorted.sort_by(|a, b| mode.compare(a, b));
    }
    sorted
}
