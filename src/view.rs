// Display-ready rows and labels for front ends

use crate::filter::FilterMode;
use crate::kv::KvStore;
use crate::models::{Priority, Stats, Task, Theme};
use crate::sort::SortMode;
use crate::store::TaskStore;
use chrono::{Days, Local, NaiveDate};

/// Today's date in the local timezone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// "Today", "Tomorrow", or a date like "Jan 5, 2025"
pub fn format_due(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "Today".to_string()
    } else if today.checked_add_days(Days::new(1)) == Some(date) {
        "Tomorrow".to_string()
    } else {
        date.format("%b %-d, %Y").to_string()
    }
}

/// Due before today and still open
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    !task.completed && task.due_date.is_some_and(|due| due < today)
}

impl Priority {
    /// Colored marker; unknown priorities get a neutral one
    pub fn icon(&self) -> &'static str {
        match self {
            Priority::High => "🔴",
            Priority::Medium => "🟡",
            Priority::Low => "🟢",
            Priority::Other(_) => "⚪",
        }
    }

    /// The priority with its first letter capitalized
    pub fn label(&self) -> String {
        let mut chars = self.as_str().chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// One rendered list row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub due_label: Option<String>,
    pub overdue: bool,
    pub priority: Priority,
    pub priority_icon: &'static str,
    pub priority_label: String,
}

impl TaskView {
    pub fn from_task(task: &Task, today: NaiveDate) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            description: (!task.description.is_empty()).then(|| task.description.clone()),
            completed: task.completed,
            due_label: task.due_date.map(|d| format_due(d, today)),
            overdue: is_overdue(task, today),
            priority: task.priority.clone(),
            priority_icon: task.priority.icon(),
            priority_label: task.priority.label(),
        }
    }
}

/// Everything a front end needs to draw the board once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    pub stats: Stats,
    pub filter: FilterMode,
    pub sort: SortMode,
    pub submit_label: &'static str,
    pub theme: Theme,
    pub rows: Vec<TaskView>,
}

impl BoardView {
    pub fn build<S: KvStore>(store: &TaskStore<S>, today: NaiveDate) -> Self {
        Self {
            stats: store.stats(),
            filter: store.filter(),
            sort: store.sort(),
            submit_label: store.submit_label(),
            theme: store.theme(),
            rows: store
                .visible()
                .iter()
                .map(|task| TaskView::from_task(task, today))
                .collect(),
        }
    }

    /// True when the empty-state message should be shown
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
