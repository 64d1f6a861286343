// Task collection manager: owns the task list and keeps it persisted

use crate::filter::{FilterMode, filter_tasks};
use crate::kv::KvStore;
use crate::models::{Priority, Stats, Task, TaskInput, Theme, new_task_id, now, parse_due_date};
use crate::sort::{SortMode, sort_tasks};
use eyre::{Context, Result};
use tracing::{debug, info, warn};

/// Storage key holding the JSON array of tasks
pub const TASKS_KEY: &str = "tasks";

/// Storage key holding "light" or "dark"
pub const THEME_KEY: &str = "theme";

/// Owner of the task collection and the view state around it
///
/// The in-memory collection is authoritative. After every mutation the full
/// collection is written back under [`TASKS_KEY`], replacing the old value.
pub struct TaskStore<S: KvStore> {
    kv: S,
    tasks: Vec<Task>,
    filter: FilterMode,
    sort: SortMode,
    editing: Option<String>,
    theme: Theme,
}

impl<S: KvStore> TaskStore<S> {
    /// Build a store from whatever snapshot `kv` holds
    ///
    /// A missing or corrupt task snapshot starts an empty collection rather
    /// than failing. Errors only come from the storage medium itself.
    pub fn load(kv: S) -> Result<Self> {
        let tasks = match kv.get(TASKS_KEY)? {
            Some(json) => match serde_json::from_str::<Vec<Task>>(&json) {
                Ok(tasks) => tasks,
                Err(e) => {
                    warn!(error = ?e, "Stored tasks are unreadable, starting empty");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let theme = Theme::from_stored(kv.get(THEME_KEY)?.as_deref());

        info!(count = tasks.len(), %theme, "Loaded task store");

        Ok(Self {
            kv,
            tasks,
            filter: FilterMode::default(),
            sort: SortMode::default(),
            editing: None,
            theme,
        })
    }

    /// All tasks in collection order (newest first)
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Create a task from raw form input and put it at the front
    pub fn create(&mut self, input: TaskInput) -> Result<Task> {
        let task = Task {
            id: new_task_id(),
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            due_date: parse_due_date(&input.due_date),
            priority: Priority::from(input.priority),
            completed: false,
            created_at: now(),
            updated_at: None,
        };

        let mut next = Vec::with_capacity(self.tasks.len() + 1);
        next.push(task.clone());
        next.extend(self.tasks.iter().cloned());
        self.commit(next)?;

        info!(id = %task.id, "Created task");
        Ok(task)
    }

    /// Overwrite a task's editable fields
    ///
    /// Returns `false` without touching anything when `id` is unknown.
    pub fn update(&mut self, id: &str, input: TaskInput) -> Result<bool> {
        let Some(pos) = self.position(id) else {
            debug!(id, "update: no such task");
            return Ok(false);
        };

        let mut next = self.tasks.clone();
        let task = &mut next[pos];
        task.title = input.title.trim().to_string();
        task.description = input.description.trim().to_string();
        task.due_date = parse_due_date(&input.due_date);
        task.priority = Priority::from(input.priority);
        task.updated_at = Some(now());

        self.commit(next)?;

        info!(id, "Updated task");
        Ok(true)
    }

    /// Remove a task for good
    ///
    /// Confirmation is the caller's job. Returns `false` if `id` is unknown.
    /// The edit slot is left alone; a later submit against it finds nothing.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        let next: Vec<Task> = self.tasks.iter().filter(|t| t.id != id).cloned().collect();

        if next.len() == self.tasks.len() {
            debug!(id, "delete: no such task");
            return Ok(false);
        }

        self.commit(next)?;

        info!(id, "Deleted task");
        Ok(true)
    }

    /// Flip a task's completed flag. Returns `false` if `id` is unknown.
    pub fn toggle_completion(&mut self, id: &str) -> Result<bool> {
        let Some(pos) = self.position(id) else {
            debug!(id, "toggle_completion: no such task");
            return Ok(false);
        };

        let mut next = self.tasks.clone();
        next[pos].completed = !next[pos].completed;
        let completed = next[pos].completed;

        self.commit(next)?;

        info!(id, completed, "Toggled task");
        Ok(true)
    }

    // ========================================================================
    // Edit slot
    // ========================================================================

    /// Mark `id` as the task being edited and return its current values
    ///
    /// There is one edit slot; a second call replaces the first. Unknown ids
    /// return `None` and leave the slot alone.
    pub fn begin_edit(&mut self, id: &str) -> Option<Task> {
        let task = self.get(id)?.clone();
        self.editing = Some(task.id.clone());
        debug!(id, "Editing task");
        Some(task)
    }

    /// Leave edit mode. Safe to call at any time.
    pub fn end_edit(&mut self) {
        self.editing = None;
    }

    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    /// Label for the form's submit action
    pub fn submit_label(&self) -> &'static str {
        if self.editing.is_some() { "Update Task" } else { "Add Task" }
    }

    /// Form submit: update the task under edit, or create a new one
    ///
    /// Edit mode ends whether or not the write succeeds. Returns the resulting
    /// task, or `None` if the edited task no longer exists.
    pub fn submit(&mut self, input: TaskInput) -> Result<Option<Task>> {
        match self.editing.take() {
            Some(id) => {
                let found = self.update(&id, input)?;
                Ok(if found { self.get(&id).cloned() } else { None })
            }
            None => Ok(Some(self.create(input)?)),
        }
    }

    // ========================================================================
    // View state
    // ========================================================================

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    pub fn set_filter(&mut self, filter: FilterMode) {
        self.filter = filter;
    }

    pub fn sort(&self) -> SortMode {
        self.sort
    }

    pub fn set_sort(&mut self, sort: SortMode) {
        self.sort = sort;
    }

    /// Tasks as the list view shows them: filtered, then sorted
    pub fn visible(&self) -> Vec<Task> {
        sort_tasks(&filter_tasks(&self.tasks, self.filter), self.sort)
    }

    /// Counts over the whole collection, ignoring the current filter
    pub fn stats(&self) -> Stats {
        Stats::from_tasks(&self.tasks)
    }

    // ========================================================================
    // Theme
    // ========================================================================

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Switch between light and dark and remember the choice
    ///
    /// The in-memory theme only changes once the write has succeeded.
    pub fn toggle_theme(&mut self) -> Result<Theme> {
        let next = self.theme.toggled();
        self.kv.set(THEME_KEY, next.as_str())?;
        self.theme = next;
        info!(theme = %self.theme, "Switched theme");
        Ok(self.theme)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    /// Persist `next` and only then make it the live collection
    fn commit(&mut self, next: Vec<Task>) -> Result<()> {
        let json = serde_json::to_string(&next).context("Failed to serialize tasks")?;
        self.kv.set(TASKS_KEY, &json)?;
        debug!(count = next.len(), "Saved tasks");
        self.tasks = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::{MemoryKv, SqliteKv};
    use tempfile::TempDir;

    fn new_store() -> TaskStore<MemoryKv> {
        TaskStore::load(MemoryKv::new()).unwrap()
    }

    fn stored_json(store: &TaskStore<MemoryKv>) -> Option<String> {
        store.kv.get(TASKS_KEY).unwrap()
    }

    #[test]
    fn test_load_empty() {
        let store = new_store();
        assert!(store.tasks().is_empty());
        assert_eq!(store.filter(), FilterMode::All);
        assert_eq!(store.sort(), SortMode::DateAsc);
        assert_eq!(store.theme(), Theme::Light);
        assert_eq!(store.editing(), None);
    }

    #[test]
    fn test_load_corrupt_snapshot_starts_empty() {
        let mut kv = MemoryKv::new();
        kv.set(TASKS_KEY, "{not json").unwrap();
        kv.set(THEME_KEY, "dark").unwrap();

        let store = TaskStore::load(kv).unwrap();
        assert!(store.tasks().is_empty());
        assert_eq!(store.theme(), Theme::Dark);
    }

    #[test]
    fn test_create() {
        let mut store = new_store();
        store.create(TaskInput::new("First")).unwrap();

        let task = store
            .create(
                TaskInput::new("  A  ")
                    .description("  details ")
                    .due_date("")
                    .priority("high"),
            )
            .unwrap();

        assert_eq!(store.tasks().len(), 2);
        assert_eq!(store.tasks()[0].id, task.id);
        assert_eq!(task.title, "A");
        assert_eq!(task.description, "details");
        assert_eq!(task.due_date, None);
        assert_eq!(task.priority, Priority::High);
        assert!(!task.completed);
        assert!(task.updated_at.is_none());
        assert_ne!(store.tasks()[0].id, store.tasks()[1].id);
    }

    #[test]
    fn test_create_accepts_unknown_priority() {
        let mut store = new_store();
        let task = store.create(TaskInput::new("A").priority("urgent")).unwrap();
        assert_eq!(task.priority, Priority::Other("urgent".to_string()));
    }

    #[test]
    fn test_create_persists() {
        let mut store = new_store();
        store.create(TaskInput::new("A")).unwrap();

        let json = stored_json(&store).unwrap();
        let stored: Vec<Task> = serde_json::from_str(&json).unwrap();
        assert_eq!(stored, store.tasks());
    }

    #[test]
    fn test_update() {
        let mut store = new_store();
        let original = store.create(TaskInput::new("Old").priority("low")).unwrap();
        store.toggle_completion(&original.id).unwrap();

        let found = store
            .update(
                &original.id,
                TaskInput::new(" New ")
                    .description("d")
                    .due_date("2025-06-01")
                    .priority("high"),
            )
            .unwrap();
        assert!(found);

        let task = store.get(&original.id).unwrap();
        assert_eq!(task.title, "New");
        assert_eq!(task.description, "d");
        assert_eq!(task.due_date, parse_due_date("2025-06-01"));
        assert_eq!(task.priority, Priority::High);
        assert!(task.completed);
        assert_eq!(task.created_at, original.created_at);
        assert!(task.updated_at.is_some());
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let mut store = new_store();
        store.create(TaskInput::new("A")).unwrap();
        let before = stored_json(&store);
        let tasks_before = store.tasks().to_vec();

        let found = store.update("nonexistent-id", TaskInput::new("B")).unwrap();
        assert!(!found);
        assert_eq!(stored_json(&store), before);
        assert_eq!(store.tasks(), tasks_before.as_slice());
    }

    #[test]
    fn test_delete() {
        let mut store = new_store();
        let a = store.create(TaskInput::new("A")).unwrap();
        store.create(TaskInput::new("B")).unwrap();

        assert!(store.delete(&a.id).unwrap());
        assert_eq!(store.tasks().len(), 1);
        assert!(store.get(&a.id).is_none());

        assert!(!store.delete("nonexistent-id").unwrap());
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn test_submit_after_edited_task_deleted_is_noop() {
        let mut store = new_store();
        let a = store.create(TaskInput::new("A")).unwrap();
        store.begin_edit(&a.id).unwrap();

        store.delete(&a.id).unwrap();
        assert_eq!(store.editing(), Some(a.id.as_str()));
        let before = stored_json(&store);

        let result = store.submit(TaskInput::new("edited A")).unwrap();
        assert_eq!(result, None);
        assert!(store.tasks().is_empty());
        assert_eq!(stored_json(&store), before);
        assert_eq!(store.editing(), None);
    }

    #[test]
    fn test_toggle_twice_restores() {
        let mut store = new_store();
        let a = store.create(TaskInput::new("A")).unwrap();

        assert!(store.toggle_completion(&a.id).unwrap());
        assert!(store.get(&a.id).unwrap().completed);
        assert!(store.toggle_completion(&a.id).unwrap());
        assert!(!store.get(&a.id).unwrap().completed);

        assert!(!store.toggle_completion("nonexistent-id").unwrap());
    }

    #[test]
    fn test_edit_slot() {
        let mut store = new_store();
        let a = store.create(TaskInput::new("A")).unwrap();
        let b = store.create(TaskInput::new("B")).unwrap();

        assert_eq!(store.submit_label(), "Add Task");

        let snapshot = store.begin_edit(&a.id).unwrap();
        assert_eq!(snapshot.title, "A");
        assert_eq!(store.editing(), Some(a.id.as_str()));
        assert_eq!(store.submit_label(), "Update Task");

        store.begin_edit(&b.id).unwrap();
        assert_eq!(store.editing(), Some(b.id.as_str()));

        assert!(store.begin_edit("nonexistent-id").is_none());
        assert_eq!(store.editing(), Some(b.id.as_str()));

        store.end_edit();
        store.end_edit();
        assert_eq!(store.editing(), None);
        assert_eq!(store.submit_label(), "Add Task");
    }

    #[test]
    fn test_submit_creates_or_updates() {
        let mut store = new_store();

        let created = store.submit(TaskInput::new("A")).unwrap().unwrap();
        assert_eq!(store.tasks().len(), 1);

        store.begin_edit(&created.id).unwrap();
        let updated = store.submit(TaskInput::new("A2")).unwrap().unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.title, "A2");
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(store.editing(), None);
    }

    #[test]
    fn test_visible_applies_filter_then_sort() {
        let mut store = new_store();
        let low = store.create(TaskInput::new("low").priority("low")).unwrap();
        let high = store.create(TaskInput::new("high").priority("high")).unwrap();
        let done = store.create(TaskInput::new("done").priority("high")).unwrap();
        store.toggle_completion(&done.id).unwrap();

        store.set_filter(FilterMode::Pending);
        store.set_sort(SortMode::PriorityLow);

        let visible: Vec<String> = store.visible().into_iter().map(|t| t.id).collect();
        assert_eq!(visible, vec![low.id, high.id]);
        assert_eq!(store.tasks().len(), 3);
    }

    #[test]
    fn test_stats() {
        let mut store = new_store();
        let a = store.create(TaskInput::new("A")).unwrap();
        store.create(TaskInput::new("B")).unwrap();
        store.create(TaskInput::new("C")).unwrap();
        store.toggle_completion(&a.id).unwrap();

        store.set_filter(FilterMode::Completed);
        assert_eq!(
            store.stats(),
            Stats {
                total: 3,
                completed: 1,
                pending: 2
            }
        );
    }

    #[test]
    fn test_toggle_theme_persists() {
        let mut store = new_store();
        assert_eq!(store.toggle_theme().unwrap(), Theme::Dark);
        assert_eq!(store.kv.get(THEME_KEY).unwrap(), Some("dark".to_string()));
        assert_eq!(store.toggle_theme().unwrap(), Theme::Light);
        assert_eq!(store.kv.get(THEME_KEY).unwrap(), Some("light".to_string()));
    }

    #[test]
    fn test_persistence_round_trip_sqlite() {
        let temp = TempDir::new().unwrap();

        let expected = {
            let mut store = TaskStore::load(SqliteKv::open(temp.path()).unwrap()).unwrap();
            let a = store.create(TaskInput::new("A").due_date("2025-01-01")).unwrap();
            store.create(TaskInput::new("B").priority("low")).unwrap();
            store.toggle_completion(&a.id).unwrap();
            store.update(&a.id, TaskInput::new("A2").priority("high")).unwrap();
            store.toggle_theme().unwrap();
            store.tasks().to_vec()
        };

        let reloaded = TaskStore::load(SqliteKv::open(temp.path()).unwrap()).unwrap();
        assert_eq!(reloaded.tasks(), expected.as_slice());
        assert_eq!(reloaded.theme(), Theme::Dark);
    }

    /// Storage whose writes always fail
    #[derive(Default)]
    struct FailingKv {
        inner: MemoryKv,
    }

    impl KvStore for FailingKv {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<()> {
            Err(eyre::eyre!("disk full writing {}", key))
        }
    }

    #[test]
    fn test_failed_write_leaves_state_unchanged() {
        let mut inner = MemoryKv::new();
        let seeded = r#"[{"id":"t1","title":"Seed","description":"","dueDate":null,"priority":"low","completed":false,"createdAt":"2025-01-01T00:00:00Z"}]"#;
        inner.set(TASKS_KEY, seeded).unwrap();
        let mut store = TaskStore::load(FailingKv { inner }).unwrap();
        let before = store.tasks().to_vec();

        assert!(store.create(TaskInput::new("A")).is_err());
        assert!(store.update("t1", TaskInput::new("Changed")).is_err());
        assert!(store.toggle_completion("t1").is_err());
        assert!(store.delete("t1").is_err());
        assert_eq!(store.tasks(), before.as_slice());

        assert!(store.toggle_theme().is_err());
        assert_eq!(store.theme(), Theme::Light);
    }

    #[test]
    fn test_failed_submit_still_ends_edit() {
        let mut store = TaskStore::load(FailingKv::default()).unwrap();
        assert!(store.submit(TaskInput::new("A")).is_err());
        assert_eq!(store.editing(), None);
        assert!(store.tasks().is_empty());
    }
}
