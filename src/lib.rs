// Taskboard - personal task list with a persistent key-value store

pub mod command;
pub mod config;
pub mod filter;
pub mod kv;
pub mod models;
pub mod sort;
pub mod store;
pub mod view;

// Re-export main types for convenience
pub use command::{Command, ConfirmGate, Outcome};
pub use config::Config;
pub use filter::{FilterMode, filter_tasks};
pub use kv::{KvStore, MemoryKv, SqliteKv};
pub use models::{Priority, Stats, Task, TaskInput, Theme};
pub use sort::{SortMode, sort_tasks};
pub use store::TaskStore;
pub use view::{BoardView, TaskView};
