// Explicit gesture -> store operation mapping

use crate::filter::FilterMode;
use crate::kv::KvStore;
use crate::models::{Task, TaskInput, Theme};
use crate::sort::SortMode;
use crate::store::TaskStore;
use eyre::Result;
use tracing::debug;

/// One user gesture
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Form submitted: create, or update the task under edit
    Submit(TaskInput),
    Toggle(String),
    BeginEdit(String),
    CancelEdit,
    Delete(String),
    SetFilter(FilterMode),
    SetSort(SortMode),
    ToggleTheme,
}

/// What a dispatched command did
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A task was created, updated or toggled; carries its new state
    Saved(Task),
    /// The edit surface should show this snapshot
    Editing(Task),
    Deleted(String),
    /// The confirmation gate refused a delete
    Declined,
    /// The id did not match any task
    NotFound(String),
    ThemeChanged(Theme),
    /// View state changed, nothing persisted
    ViewChanged,
}

/// Gate consulted before a task is deleted
pub trait ConfirmGate {
    fn confirm_delete(&mut self, task: &Task) -> bool;
}

impl<F> ConfirmGate for F
where
    F: FnMut(&Task) -> bool,
{
    fn confirm_delete(&mut self, task: &Task) -> bool {
        self(task)
    }
}

impl<S: KvStore> TaskStore<S> {
    /// Run one command to completion
    pub fn dispatch(&mut self, command: Command, gate: &mut dyn ConfirmGate) -> Result<Outcome> {
        debug!(?command, "dispatch");

        let outcome = match command {
            Command::Submit(input) => {
                let editing = self.editing().map(str::to_string);
                match self.submit(input)? {
                    Some(task) => Outcome::Saved(task),
                    None => Outcome::NotFound(editing.unwrap_or_default()),
                }
            }
            Command::Toggle(id) => {
                if self.toggle_completion(&id)? {
                    self.get(&id).cloned().map(Outcome::Saved).unwrap_or(Outcome::NotFound(id))
                } else {
                    Outcome::NotFound(id)
                }
            }
            Command::BeginEdit(id) => match self.begin_edit(&id) {
                Some(task) => Outcome::Editing(task),
                None => Outcome::NotFound(id),
            },
            Command::CancelEdit => {
                self.end_edit();
                Outcome::ViewChanged
            }
            Command::Delete(id) => match self.get(&id).cloned() {
                None => Outcome::NotFound(id),
                Some(task) if !gate.confirm_delete(&task) => Outcome::Declined,
                Some(_) => {
                    self.delete(&id)?;
                    Outcome::Deleted(id)
                }
            },
            Command::SetFilter(filter) => {
                self.set_filter(filter);
                Outcome::ViewChanged
            }
            Command::SetSort(sort) => {
                self.set_sort(sort);
                Outcome::ViewChanged
            }
            Command::ToggleTheme => Outcome::ThemeChanged(self.toggle_theme()?),
        };

        Ok(outcome)
    }
}
