// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Client commands against a running instance
//!
//! Commands: sum, concat, ping, add, complete, undo, delete, list

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use addsvc_core::domain::config::ClientConfig;
use addsvc_core::domain::todo::ToDoItem;
use addsvc_core::presentation::connect;
use addsvc_core::AddService;

#[derive(Debug, Subcommand)]
pub enum ClientCommand {
    /// Add two integers
    Sum {
        #[arg(allow_negative_numbers = true)]
        a: i64,
        #[arg(allow_negative_numbers = true)]
        b: i64,
    },

    /// Concatenate two strings
    Concat { a: String, b: String },

    /// Check the remote store is reachable
    Ping,

    /// Create a to-do item
    Add {
        #[arg(value_name = "TASK")]
        task: String,

        /// Create the item already done
        #[arg(long)]
        done: bool,
    },

    /// Mark a to-do item done
    Complete {
        #[arg(value_name = "TASK_ID")]
        task_id: String,
    },

    /// Mark a to-do item not done
    Undo {
        #[arg(value_name = "TASK_ID")]
        task_id: String,
    },

    /// Delete a to-do item
    Delete {
        #[arg(value_name = "TASK_ID")]
        task_id: String,
    },

    /// List all to-do items
    List,
}

pub async fn handle_command(command: ClientCommand, config: &ClientConfig) -> Result<()> {
    let client = connect(config)
        .with_context(|| format!("Failed to connect to {}", config.instance))?;

    match command {
        ClientCommand::List => {
            let todos = client.get_all_todo().await.context("GetAllToDo failed")?;
            if todos.is_empty() {
                println!("{}", "No to-do items".yellow());
            }
            for item in &todos {
                let line = format_item(item);
                if item.status {
                    println!("{}", line.dimmed());
                } else {
                    println!("{}", line);
                }
            }
        }
        command => {
            let output = execute(command, &client).await?;
            println!("{}", output.green());
        }
    }
    Ok(())
}

/// Run a single command and render its result as one line.
pub async fn execute(command: ClientCommand, svc: &dyn AddService) -> Result<String> {
    let output = match command {
        ClientCommand::Sum { a, b } => svc.sum(a, b).await.context("Sum failed")?.to_string(),
        ClientCommand::Concat { a, b } => svc.concat(&a, &b).await.context("Concat failed")?,
        ClientCommand::Ping => svc.ping().await.context("Ping failed")?,
        ClientCommand::Add { task, done } => {
            let item = ToDoItem {
                status: done,
                ..ToDoItem::new(task)
            };
            let id = svc.add_todo(item).await.context("AddToDo failed")?;
            format!("✓ Added {}", id)
        }
        ClientCommand::Complete { task_id } => {
            let id = svc.complete_todo(&task_id).await.context("CompleteToDo failed")?;
            format!("✓ Completed {}", id)
        }
        ClientCommand::Undo { task_id } => {
            let id = svc.undo_todo(&task_id).await.context("UnDoToDo failed")?;
            format!("✓ Reopened {}", id)
        }
        ClientCommand::Delete { task_id } => {
            let id = svc.delete_todo(&task_id).await.context("DeleteToDo failed")?;
            format!("✓ Deleted {}", id)
        }
        ClientCommand::List => {
            let todos = svc.get_all_todo().await.context("GetAllToDo failed")?;
            todos.iter().map(format_item).collect::<Vec<_>>().join("\n")
        }
    };
    Ok(output)
}

fn format_item(item: &ToDoItem) -> String {
    let mark = if item.status { "x" } else { " " };
    format!("[{}] {}  {}", mark, item.id, item.task)
}
