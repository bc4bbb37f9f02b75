//! Command-line entry point for manual smoke checks.
//!
//! # Responsibility
//! - Map a small command vocabulary onto `TaskStore` operations.
//! - Keep output deterministic so runs can be diffed.
//!
//! # See also
//! - `tasksparkle_core::TaskStore` for the operations themselves.

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use log::info;
use std::process::ExitCode;
use tasksparkle_core::repo::task_repo::parse_due_date;
use tasksparkle_core::{
    init_logging, CategoryFilter, CategoryId, LogSettings, NewCategory, NewTask, Priority,
    Recurrence, StoreConfig, Task, TaskId, TaskPatch, TaskStore, TaskView, ToggleOutcome,
};

/// TaskSparkle: local task store with recurring tasks.
#[derive(Debug, Parser)]
#[command(name = "tasksparkle", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a task.
    Add {
        /// Task title; words are joined with spaces.
        #[arg(required = true)]
        title: Vec<String>,
        #[arg(long)]
        notes: Option<String>,
        /// low, medium or high.
        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,
        /// Category id; defaults to the first category.
        #[arg(long)]
        category: Option<CategoryId>,
        /// YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS, local time.
        #[arg(long, value_parser = parse_due)]
        due: Option<NaiveDateTime>,
        /// daily, weekly, monthly, quarterly, half-yearly or yearly.
        #[arg(long, value_parser = parse_recurrence)]
        repeat: Option<Recurrence>,
    },
    /// Show the sorted task list with metrics.
    List {
        /// Ignore the saved category filter.
        #[arg(long, conflicts_with = "category")]
        all: bool,
        #[arg(long)]
        category: Option<CategoryId>,
        /// Print the view as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Complete a task; recurring tasks roll over.
    Done { id: TaskId },
    /// Mark a completed task pending again.
    Undo { id: TaskId },
    /// Change fields of a task.
    Edit {
        id: TaskId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,
        #[arg(long)]
        category: Option<CategoryId>,
        /// A due date, or `none` to clear it.
        #[arg(long, value_parser = parse_due_edit)]
        due: Option<DueEdit>,
        #[arg(long, value_parser = parse_recurrence)]
        repeat: Option<Recurrence>,
    },
    /// Delete a task.
    Rm { id: TaskId },
    /// Delete every completed task.
    Clear,
    /// Show or set the saved category filter (`all` or a category id).
    Filter {
        #[arg(value_parser = parse_filter)]
        target: Option<CategoryFilter>,
    },
    /// List categories, or add one.
    Categories {
        #[command(subcommand)]
        action: Option<CategoryCommand>,
    },
    /// Show or replace the scratch note.
    Note { text: Vec<String> },
    /// Print the core version.
    Version,
}

#[derive(Debug, Subcommand)]
enum CategoryCommand {
    /// Create a category.
    Add { name: String, color: String },
}

/// `--due` on edit: set a new deadline or clear it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DueEdit {
    Clear,
    Set(NaiveDateTime),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), String> {
    if let Command::Version = command {
        println!("tasksparkle_core version={}", tasksparkle_core::core_version());
        return Ok(());
    }

    if let Some(settings) = LogSettings::from_env()? {
        init_logging(&settings)?;
    }
    let store = TaskStore::open(&StoreConfig::from_env()).map_err(|err| err.to_string())?;
    info!(
        "event=cli_command module=cli status=start command={}",
        command_name(&command)
    );

    match command {
        Command::Add {
            title,
            notes,
            priority,
            category,
            due,
            repeat,
        } => {
            let category_id = match category {
                Some(id) => id,
                None => default_category(&store)?,
            };
            let mut task = NewTask::new(title.join(" "), category_id);
            task.notes = notes;
            task.priority = priority;
            task.due_date = due;
            task.recurring = repeat;
            let id = store.add_task(task).map_err(|err| err.to_string())?;
            println!("added task_id={id}");
        }
        Command::List {
            all,
            category,
            json,
        } => {
            let filter = match (all, category) {
                (true, _) => CategoryFilter::All,
                (false, Some(id)) => CategoryFilter::Only(id),
                (false, None) => CategoryFilter::from(
                    store
                        .active_category_filter()
                        .map_err(|err| err.to_string())?,
                ),
            };
            let view = store.task_view(filter).map_err(|err| err.to_string())?;
            if json {
                let text = serde_json::to_string_pretty(&view).map_err(|err| err.to_string())?;
                println!("{text}");
            } else {
                print_view(&store, &view)?;
            }
        }
        Command::Done { id } => toggle(&store, id, false)?,
        Command::Undo { id } => toggle(&store, id, true)?,
        Command::Edit {
            id,
            title,
            notes,
            priority,
            category,
            due,
            repeat,
        } => {
            let patch = TaskPatch {
                title,
                notes,
                priority,
                category_id: category,
                due_date: due.map(|edit| match edit {
                    DueEdit::Clear => None,
                    DueEdit::Set(value) => Some(value),
                }),
                is_completed: None,
                recurring: repeat,
            };
            let task = store.update_task(id, &patch).map_err(|err| err.to_string())?;
            println!("updated task_id={}", task.id);
        }
        Command::Rm { id } => {
            store.delete_task(id).map_err(|err| err.to_string())?;
            println!("deleted task_id={id}");
        }
        Command::Clear => {
            let removed = store.clear_completed().map_err(|err| err.to_string())?;
            println!("cleared completed={removed}");
        }
        Command::Filter { target } => {
            if let Some(filter) = target {
                store
                    .set_category_filter(filter.category_id())
                    .map_err(|err| err.to_string())?;
            }
            let active = store
                .active_category_filter()
                .map_err(|err| err.to_string())?;
            match active {
                Some(id) => println!("filter category_id={id}"),
                None => println!("filter all"),
            }
        }
        Command::Categories {
            action: Some(CategoryCommand::Add { name, color }),
        } => {
            let id = store
                .add_category(NewCategory::new(name, color))
                .map_err(|err| err.to_string())?;
            println!("added category_id={id}");
        }
        Command::Categories { action: None } => {
            for category in store.list_categories().map_err(|err| err.to_string())? {
                println!("#{} {} {}", category.id, category.name, category.color);
            }
        }
        Command::Note { text } => {
            if text.is_empty() {
                println!("{}", store.scratch_note().map_err(|err| err.to_string())?);
            } else {
                store
                    .set_scratch_note(&text.join(" "))
                    .map_err(|err| err.to_string())?;
                println!("note saved");
            }
        }
        Command::Version => {}
    }
    Ok(())
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Add { .. } => "add",
        Command::List { .. } => "list",
        Command::Done { .. } => "done",
        Command::Undo { .. } => "undo",
        Command::Edit { .. } => "edit",
        Command::Rm { .. } => "rm",
        Command::Clear => "clear",
        Command::Filter { .. } => "filter",
        Command::Categories { .. } => "categories",
        Command::Note { .. } => "note",
        Command::Version => "version",
    }
}

fn print_view(store: &TaskStore, view: &TaskView) -> Result<(), String> {
    let metrics = view.metrics;
    println!(
        "total={} completed={} pending_today={} progress={:.0}%",
        metrics.total, metrics.completed, metrics.pending_today, metrics.progress
    );
    for task in &view.tasks {
        let category = store
            .resolve_category(task)
            .map_err(|err| err.to_string())?
            .map_or_else(|| "-".to_string(), |category| category.name);
        println!("{}", format_task_line(task, &category));
    }
    Ok(())
}

fn format_task_line(task: &Task, category: &str) -> String {
    let mark = if task.is_completed { 'x' } else { ' ' };
    let due = task
        .due_date
        .map_or_else(|| "-".to_string(), |due| due.format("%Y-%m-%d %H:%M").to_string());
    let repeat = if task.recurring.is_recurring() {
        format!(" ({})", task.recurring.label())
    } else {
        String::new()
    };
    format!(
        "[{mark}] #{} {} | {} | {} | due {}{}",
        task.id,
        task.title,
        task.priority.label(),
        category,
        due,
        repeat
    )
}

fn toggle(store: &TaskStore, id: TaskId, current_status: bool) -> Result<(), String> {
    let outcome = store
        .toggle_task_completed(id, current_status)
        .map_err(|err| err.to_string())?;
    match outcome {
        ToggleOutcome::Reopened(id) => println!("reopened task_id={id}"),
        ToggleOutcome::Completed(id) => println!("completed task_id={id}"),
        ToggleOutcome::RolledOver {
            completed,
            successor,
        } => println!("completed task_id={completed} next_task_id={successor}"),
    }
    Ok(())
}

fn default_category(store: &TaskStore) -> Result<CategoryId, String> {
    store
        .list_categories()
        .map_err(|err| err.to_string())?
        .first()
        .map(|category| category.id)
        .ok_or_else(|| "no categories exist; pass --category".to_string())
}

fn parse_priority(raw: &str) -> Result<Priority, String> {
    Priority::parse(raw).ok_or_else(|| format!("invalid priority `{raw}`"))
}

fn parse_recurrence(raw: &str) -> Result<Recurrence, String> {
    Recurrence::parse(raw).ok_or_else(|| format!("invalid repeat frequency `{raw}`"))
}

fn parse_due(raw: &str) -> Result<NaiveDateTime, String> {
    parse_due_date(raw.trim()).ok_or_else(|| format!("invalid due date `{raw}`"))
}

fn parse_due_edit(raw: &str) -> Result<DueEdit, String> {
    if raw.trim().eq_ignore_ascii_case("none") {
        return Ok(DueEdit::Clear);
    }
    parse_due(raw).map(DueEdit::Set)
}

fn parse_filter(raw: &str) -> Result<CategoryFilter, String> {
    if raw.trim().eq_ignore_ascii_case("all") {
        return Ok(CategoryFilter::All);
    }
    raw.trim()
        .parse::<CategoryId>()
        .map(CategoryFilter::Only)
        .map_err(|_| format!("invalid category `{raw}`; expected `all` or an id"))
}
