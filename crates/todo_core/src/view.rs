//! Client-side views over a list snapshot: filtering by completion and
//! ordering by priority, due date or creation time. Nothing here touches
//! the store.

use crate::error::AppError;
use crate::model::Task;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.completed,
            Self::Completed => task.completed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Filter {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" | "done" => Ok(Self::Completed),
            other => Err(AppError::validation(format!(
                "filter must be one of all, active, completed (got '{other}')"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortMode {
    Priority,
    DueDate,
    /// Newest first.
    #[default]
    #[serde(alias = "createdAt")]
    Date,
}

impl SortMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Priority => "priority",
            Self::DueDate => "dueDate",
            Self::Date => "date",
        }
    }

    fn compare(self, left: &Task, right: &Task) -> Ordering {
        match self {
            Self::Priority => left.priority.rank().cmp(&right.priority.rank()),
            // `None` keys land after every dated task.
            Self::DueDate => match (left.due_date, right.due_date) {
                (Some(l), Some(r)) => l.cmp(&r),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            Self::Date => Reverse(left.created_at).cmp(&Reverse(right.created_at)),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let canonical: String = raw
            .trim()
            .chars()
            .filter(|ch| *ch != '-' && *ch != '_')
            .map(|ch| ch.to_ascii_lowercase())
            .collect();
        match canonical.as_str() {
            "priority" => Ok(Self::Priority),
            "duedate" | "due" => Ok(Self::DueDate),
            "date" | "createdat" | "created" => Ok(Self::Date),
            _ => Err(AppError::validation(format!(
                "sort must be one of priority, dueDate, date (got '{}')",
                raw.trim()
            ))),
        }
    }
}

pub fn filter_tasks(tasks: &[Task], filter: Filter) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| filter.matches(task))
        .cloned()
        .collect()
}

/// Stable: ties keep their relative input order.
pub fn sort_tasks(tasks: &mut [Task], sort: SortMode) {
    tasks.sort_by(|left, right| sort.compare(left, right));
}

/// Filters, then sorts the filtered subsequence.
pub fn apply(tasks: &[Task], filter: Filter, sort: SortMode) -> Vec<Task> {
    let mut visible = filter_tasks(tasks, filter);
    sort_tasks(&mut visible, sort);
    visible
}
