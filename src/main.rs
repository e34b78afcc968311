#![allow(missing_docs)]

//! Taskmill CLI — extract tasks from communication text and manage them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use taskmill::config::TaskmillConfig;
use taskmill::extract::{self, TaskExtractor};
use taskmill::model::{InputKind, PrioritizationMethod, Priority, Task, TaskStatus};
use taskmill::pipeline::ExtractionPipeline;
use taskmill::store::{NewTask, TaskStore, TaskUpdate};

#[derive(Parser)]
#[command(name = "taskmill", version, about = "Turn communication text into tracked tasks")]
struct Cli {
    /// User the records belong to.
    #[arg(long, global = true, default_value = "local")]
    user: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract tasks from text (a file, or stdin when no file is given).
    Extract {
        /// Title for the communication record.
        #[arg(long)]
        title: String,
        /// Input file; stdin when omitted.
        #[arg(long)]
        file: Option<PathBuf>,
        /// Input kind: text, file, or voice.
        #[arg(long, default_value = "text")]
        kind: String,
    },
    /// Summarize text without persisting anything.
    Summarize {
        /// Input file; stdin when omitted.
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// List stored communications.
    Comms,
    /// Manage tasks.
    #[command(subcommand)]
    Tasks(TasksCommand),
    /// Show recent activity log entries.
    Activity {
        /// Maximum entries to show.
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Show or set the prioritization method.
    Method {
        /// New method: eisenhower, eat-the-frog, abcde, or chunking.
        set: Option<String>,
    },
}

#[derive(Subcommand)]
enum TasksCommand {
    /// List tasks, newest first.
    List,
    /// Create a task manually.
    Add {
        /// Task title.
        title: String,
        /// Task description.
        #[arg(long, default_value = "")]
        description: String,
        /// Priority: low, medium, or high.
        #[arg(long, default_value = "medium")]
        priority: String,
        /// Due date (RFC 3339 or YYYY-MM-DD).
        #[arg(long)]
        due: Option<String>,
        /// Tags.
        #[arg(long)]
        tag: Vec<String>,
    },
    /// Edit fields of an existing task.
    Edit {
        /// Task id.
        id: i64,
        /// New title.
        #[arg(long)]
        title: Option<String>,
        /// New description.
        #[arg(long)]
        description: Option<String>,
        /// New priority: low, medium, or high.
        #[arg(long)]
        priority: Option<String>,
        /// New due date (RFC 3339 or YYYY-MM-DD).
        #[arg(long)]
        due: Option<String>,
        /// New assignee.
        #[arg(long)]
        assignee: Option<String>,
    },
    /// Mark a task completed.
    Done {
        /// Task id.
        id: i64,
    },
    /// Delete a task.
    Rm {
        /// Task id.
        id: i64,
    },
    /// Show aggregate task counts.
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = TaskmillConfig::load().context("failed to load configuration")?;

    let _logging_guard = match &config.paths.logs_dir {
        Some(dir) => Some(taskmill::logging::init_with_file(Path::new(dir))?),
        None => {
            taskmill::logging::init();
            None
        }
    };

    let store = TaskStore::open(&config.paths.database)
        .await
        .context("failed to open task store")?;

    match cli.command {
        Command::Extract { title, file, kind } => {
            let kind = InputKind::parse(&kind).context("invalid --kind")?;
            let content = read_input(file.as_deref())?;
            let extractor = build_extractor(&config)?;
            let pipeline = ExtractionPipeline::new(extractor, store);

            let outcome = pipeline
                .process_and_extract(&cli.user, &title, &content, kind)
                .await?;

            println!(
                "communication {} recorded: {}",
                outcome.communication.id,
                outcome.communication.summary.as_deref().unwrap_or("-")
            );
            println!("{} task(s) extracted", outcome.tasks.len());
            for task in &outcome.tasks {
                print_task(task);
            }
        }

        Command::Summarize { file } => {
            let content = read_input(file.as_deref())?;
            let extractor = build_extractor(&config)?;
            let pipeline = ExtractionPipeline::new(extractor, store);
            println!("{}", pipeline.summarize(&content).await?);
        }

        Command::Comms => {
            for comm in store.communications_for_user(&cli.user).await? {
                println!(
                    "[{}] {} ({}) — {}",
                    comm.id,
                    comm.title,
                    comm.kind.as_str(),
                    comm.summary.as_deref().unwrap_or("-")
                );
            }
        }

        Command::Tasks(cmd) => run_tasks_command(&store, &cli.user, cmd).await?,

        Command::Activity { limit } => {
            for entry in store.activities_for_user(&cli.user, limit).await? {
                println!("{} {} — {}", entry.created_at, entry.action, entry.description);
            }
        }

        Command::Method { set } => match set {
            Some(value) => {
                let method =
                    PrioritizationMethod::parse(&value).context("invalid prioritization method")?;
                store.set_prioritization_method(&cli.user, method).await?;
                println!("prioritization method set to {}", method.as_str());
            }
            None => {
                let method = store.prioritization_method(&cli.user).await?;
                println!("{}", method.as_str());
            }
        },
    }

    Ok(())
}

async fn run_tasks_command(store: &TaskStore, user: &str, cmd: TasksCommand) -> Result<()> {
    match cmd {
        TasksCommand::List => {
            for task in store.tasks_for_user(user).await? {
                print_task(&task);
            }
        }

        TasksCommand::Add {
            title,
            description,
            priority,
            due,
            tag,
        } => {
            let priority = Priority::parse(&priority).context("invalid --priority")?;
            let task = store
                .create_task(NewTask {
                    user_id: user.to_owned(),
                    communication_id: None,
                    title,
                    description,
                    priority,
                    status: TaskStatus::Pending,
                    assignee: None,
                    tags: tag,
                    due_date: due,
                })
                .await?;
            store
                .create_activity(
                    user,
                    Some(task.id),
                    "created",
                    &format!("Task \"{}\" created manually", task.title),
                )
                .await?;
            print_task(&task);
        }

        TasksCommand::Edit {
            id,
            title,
            description,
            priority,
            due,
            assignee,
        } => {
            let priority = priority
                .as_deref()
                .map(Priority::parse)
                .transpose()
                .context("invalid --priority")?;
            let task = store
                .update_task(
                    user,
                    id,
                    TaskUpdate {
                        title,
                        description,
                        priority,
                        due_date: due,
                        assignee,
                        ..TaskUpdate::default()
                    },
                )
                .await?;
            store
                .create_activity(
                    user,
                    Some(task.id),
                    "updated",
                    &format!("Task \"{}\" updated", task.title),
                )
                .await?;
            print_task(&task);
        }

        TasksCommand::Done { id } => {
            let task = store
                .update_task(
                    user,
                    id,
                    TaskUpdate {
                        status: Some(TaskStatus::Completed),
                        ..TaskUpdate::default()
                    },
                )
                .await?;
            store
                .create_activity(
                    user,
                    Some(task.id),
                    "completed",
                    &format!("Task \"{}\" completed", task.title),
                )
                .await?;
            print_task(&task);
        }

        TasksCommand::Rm { id } => {
            let task = store.task(user, id).await?;
            store.delete_task(user, id).await?;
            store
                .create_activity(
                    user,
                    None,
                    "deleted",
                    &format!("Task \"{}\" deleted", task.title),
                )
                .await?;
            println!("task {id} deleted");
        }

        TasksCommand::Stats => {
            let stats = store.task_stats(user).await?;
            println!(
                "total {}  pending {}  in progress {}  completed {}  overdue {}",
                stats.total, stats.pending, stats.in_progress, stats.completed, stats.overdue
            );
        }
    }
    Ok(())
}

fn build_extractor(config: &TaskmillConfig) -> Result<Arc<dyn TaskExtractor>> {
    extract::from_config(&config.extractor).context("failed to build extractor")
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => std::io::read_to_string(std::io::stdin()).context("failed to read stdin"),
    }
}

fn print_task(task: &Task) {
    let due = task.due_date.as_deref().unwrap_or("-");
    let tags = if task.tags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", task.tags.join(", "))
    };
    println!(
        "[{}] {} ({}, {}) due {}{}",
        task.id,
        task.title,
        task.priority.as_str(),
        task.status.as_str(),
        due,
        tags
    );
}
