use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use std::convert::Infallible;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use taskboard::view::{self, BoardView, TaskView};
use taskboard::{Command, Config, FilterMode, Outcome, Priority, SortMode, SqliteKv, Task, TaskInput, TaskStore};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(about = "Taskboard - manage a personal to-do list")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Directory holding the task database (default: platform data dir)
    #[arg(short, long)]
    store_path: Option<PathBuf>,

    /// Config file (default: <config dir>/taskboard/config.yml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        #[arg(short, long)]
        title: String,

        #[arg(short, long, default_value = "")]
        description: String,

        /// Due date as YYYY-MM-DD
        #[arg(long, default_value = "")]
        due: String,

        /// low, medium or high
        #[arg(short, long, default_value = "medium")]
        priority: String,
    },

    /// Edit an existing task; unspecified fields keep their values
    Edit {
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,

        /// Remove the due date
        #[arg(long)]
        clear_due: bool,

        #[arg(short, long)]
        priority: Option<String>,
    },

    /// Mark a task completed, or pending again
    Toggle { id: String },

    /// Delete a task
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List tasks
    List {
        /// all, completed or pending (anything else shows all)
        #[arg(short, long, value_parser = lenient_filter)]
        filter: Option<FilterMode>,

        /// date-asc, date-desc, priority-high, priority-low or none (anything else keeps collection order)
        #[arg(short, long, value_parser = lenient_sort)]
        sort: Option<SortMode>,
    },

    /// Show task counts
    Stats,

    /// Show or switch the color theme
    Theme {
        #[arg(long)]
        toggle: bool,
    },
}

fn main() -> Result<()> {
    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let store_path = cli.store_path.clone().unwrap_or_else(|| config.resolved_store_path());

    let mut store = TaskStore::load(SqliteKv::open(&store_path)?)?;
    store.set_filter(config.default_filter.unwrap_or_default());
    store.set_sort(config.default_sort.unwrap_or_default());

    let mut gate = |_: &Task| true;

    match cli.command {
        Commands::Add {
            title,
            description,
            due,
            priority,
        } => {
            require_title(&title)?;
            let input = TaskInput::new(title).description(description).due_date(due).priority(priority);
            report(store.dispatch(Command::Submit(input), &mut gate)?);
        }
        Commands::Edit {
            id,
            title,
            description,
            due,
            clear_due,
            priority,
        } => {
            let snapshot = match store.dispatch(Command::BeginEdit(id), &mut gate)? {
                Outcome::Editing(task) => task,
                other => {
                    report(other);
                    return Ok(());
                }
            };

            let mut input = TaskInput::from_task(&snapshot);
            if let Some(title) = title {
                input.title = title;
            }
            if let Some(description) = description {
                input.description = description;
            }
            if let Some(due) = due {
                input.due_date = due;
            }
            if clear_due {
                input.due_date.clear();
            }
            if let Some(priority) = priority {
                input.priority = priority;
            }

            if let Err(e) = require_title(&input.title) {
                store.dispatch(Command::CancelEdit, &mut gate)?;
                return Err(e);
            }
            report(store.dispatch(Command::Submit(input), &mut gate)?);
        }
        Commands::Toggle { id } => {
            report(store.dispatch(Command::Toggle(id), &mut gate)?);
        }
        Commands::Delete { id, yes } => {
            let mut ask = |task: &Task| yes || confirm(&format!("Delete \"{}\"?", task.title));
            report(store.dispatch(Command::Delete(id), &mut ask)?);
        }
        Commands::List { filter, sort } => {
            if let Some(filter) = filter {
                store.dispatch(Command::SetFilter(filter), &mut gate)?;
            }
            if let Some(sort) = sort {
                store.dispatch(Command::SetSort(sort), &mut gate)?;
            }
            print_board(&BoardView::build(&store, view::today()));
        }
        Commands::Stats => {
            let stats = store.stats();
            println!(
                "Total: {}  Pending: {}  Completed: {}",
                stats.total, stats.pending, stats.completed
            );
        }
        Commands::Theme { toggle } => {
            if toggle {
                report(store.dispatch(Command::ToggleTheme, &mut gate)?);
            } else {
                println!("{}", store.theme());
            }
        }
    }

    Ok(())
}

fn lenient_filter(s: &str) -> Result<FilterMode, Infallible> {
    Ok(FilterMode::parse_lenient(s))
}

fn lenient_sort(s: &str) -> Result<SortMode, Infallible> {
    Ok(SortMode::parse_lenient(s))
}

fn require_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(eyre!("Task title cannot be empty"));
    }
    Ok(())
}

fn confirm(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

fn report(outcome: Outcome) {
    match outcome {
        Outcome::Saved(task) => {
            println!("{} {}", "Saved".green(), task.title);
            println!("  id: {}", task.id.dimmed());
        }
        Outcome::Editing(task) => println!("Editing {}", task.title),
        Outcome::Deleted(id) => println!("{} {}", "Deleted".red(), id),
        Outcome::Declined => println!("Delete cancelled"),
        Outcome::NotFound(id) => println!("{} {}", "No task with id".yellow(), id),
        Outcome::ThemeChanged(theme) => println!("Theme: {}", theme),
        Outcome::ViewChanged => {}
    }
}

fn print_board(board: &BoardView) {
    println!(
        "{}  Total: {}  Pending: {}  Completed: {}",
        format!("[{} / {}]", board.filter, board.sort).dimmed(),
        board.stats.total,
        board.stats.pending,
        board.stats.completed
    );

    if board.is_empty() {
        println!("{}", "No tasks here. Add one with `taskboard add --title ...`".dimmed());
        return;
    }

    for row in &board.rows {
        print_row(row);
    }
}

fn print_row(row: &TaskView) {
    let check = if row.completed { "[x]" } else { "[ ]" };
    let title = if row.completed {
        row.title.strikethrough().dimmed().to_string()
    } else {
        row.title.bold().to_string()
    };

    let priority = format!("{} {}", row.priority_icon, row.priority_label);
    let priority = match row.priority {
        Priority::High => priority.red().to_string(),
        Priority::Medium => priority.yellow().to_string(),
        Priority::Low => priority.green().to_string(),
        Priority::Other(_) => priority,
    };

    let mut line = format!("{} {}  {}", check, title, priority);
    if let Some(due) = &row.due_label {
        if row.overdue {
            line.push_str(&format!("  {}", format!("📅 {} (Overdue)", due).red()));
        } else {
            line.push_str(&format!("  📅 {}", due));
        }
    }

    println!("{}", line);
    if let Some(description) = &row.description {
        println!("    {}", description);
    }
    println!("    {}", row.id.dimmed());
}
