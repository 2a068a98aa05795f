use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use db::{models::task::Task, types::TaskStatus};
use futures::future::join_all;
use uuid::Uuid;

mod api;
mod board;

use api::ApiClient;

const API_BASE_ENV: &str = "PLANBOARD_API_BASE";
const TOKEN_ENV: &str = "PLANBOARD_TOKEN";
const DEFAULT_API_BASE: &str = "http://127.0.0.1:5000";

#[derive(Parser)]
#[command(name = "pb", about = "Planboard terminal board client", version)]
struct Cli {
    /// REST API base URL; defaults to PLANBOARD_API_BASE
    #[arg(long)]
    api_base: Option<String>,
    /// Bearer token; defaults to PLANBOARD_TOKEN
    #[arg(long)]
    token: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the kanban board of a project
    Board { project_id: Uuid },
    /// Move a task within its column, or to another column with --to
    Move {
        task_id: Uuid,
        /// Destination column (todo, in-progress, done)
        #[arg(long)]
        to: Option<TaskStatus>,
        /// Zero-based target index within the destination column
        #[arg(long)]
        index: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let base_url = cli
        .api_base
        .or_else(|| std::env::var(API_BASE_ENV).ok())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    let Some(token) = cli.token.or_else(|| std::env::var(TOKEN_ENV).ok()) else {
        bail!("No credential: pass --token or set {TOKEN_ENV}");
    };

    let client = ApiClient::new(base_url, token);

    match cli.command {
        Command::Board { project_id } => {
            let tasks = client.list_project_tasks(project_id).await?;
            print_board(&tasks);
        }
        Command::Move { task_id, to, index } => {
            move_task(&client, task_id, to, index).await?;
        }
    }

    Ok(())
}

async fn move_task(
    client: &ApiClient,
    task_id: Uuid,
    to: Option<TaskStatus>,
    index: usize,
) -> anyhow::Result<()> {
    let task = client.get_task(task_id).await?;
    let tasks = client.list_project_tasks(task.project_id).await?;

    let source_status = task.status;
    let dest_status = to.unwrap_or(source_status);

    let source_column = board::sorted_column(&tasks, source_status);
    let from = source_column
        .iter()
        .position(|&id| id == task_id)
        .context("Task is missing from its own column")?;

    let writes = if dest_status == source_status {
        board::plan_same_column_move(&source_column, from, index)
    } else {
        let dest_column = board::sorted_column(&tasks, dest_status);
        board::plan_cross_column_move(&source_column, &dest_column, from, index, dest_status)
    };

    // All writes go out concurrently with no ordering guarantee. Individual
    // failures are dropped; the next board fetch re-sorts by whatever
    // positions actually persisted.
    let _ = join_all(writes.iter().map(|write| client.apply_write(write))).await;

    let refreshed = client.list_project_tasks(task.project_id).await?;
    print_board(&refreshed);
    Ok(())
}

fn print_board(tasks: &[Task]) {
    for (status, title) in [
        (TaskStatus::Todo, "To Do"),
        (TaskStatus::InProgress, "In Progress"),
        (TaskStatus::Done, "Done"),
    ] {
        let column = board::sorted_column(tasks, status);
        println!("{title} ({})", column.len());
        for id in column {
            if let Some(task) = tasks.iter().find(|task| task.id == id) {
                let check = if task.subtasks.is_empty() {
                    String::new()
                } else {
                    let done = task.subtasks.iter().filter(|s| s.completed).count();
                    format!(" [{done}/{}]", task.subtasks.len())
                };
                println!("  {} ({}){check}", task.title, task.priority);
            }
        }
        println!();
    }
}
