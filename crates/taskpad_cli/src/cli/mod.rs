use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: taskpad add "Buy milk"
    Add {
        title: Option<String>,
    },
    /// Edit a task's title
    ///
    /// Example: taskpad edit task-1 "Buy organic milk"
    Edit {
        id: String,
        new_title: String,
    },
    /// Delete a task from the active list
    ///
    /// Example: taskpad delete task-1
    Delete {
        id: String,
    },
    /// Mark a task as completed
    ///
    /// Example: taskpad done task-1
    /// Example: taskpad done task-1 --undo
    Done {
        id: String,
        /// Mark the task as not completed instead
        #[arg(long)]
        undo: bool,
    },
    /// Move a task to the archive
    ///
    /// Example: taskpad archive task-1
    Archive {
        id: String,
    },
    /// Show a task with its subtasks
    ///
    /// Example: taskpad show task-1
    Show {
        id: String,
    },
    /// List tasks
    ///
    /// Example: taskpad list active
    /// Example: taskpad list archive
    List {
        #[command(subcommand)]
        list: ListCommand,
    },
    /// Manage a task's subtasks
    ///
    /// Example: taskpad subtask add task-1 "Call the store"
    Subtask {
        #[command(subcommand)]
        subtask: SubtaskCommand,
    },
    /// Generate subtasks for a task with the configured planner
    ///
    /// Example: taskpad plan task-1
    Plan {
        id: String,
    },
    /// Manage planner connection settings
    ///
    /// Example: taskpad settings show
    Settings {
        #[command(subcommand)]
        settings: SettingsCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ListCommand {
    /// List active tasks
    Active,
    /// List archived tasks, newest first
    Archive,
}

#[derive(Subcommand, Debug)]
pub enum SubtaskCommand {
    /// Add a subtask to the end of a task's list
    ///
    /// Example: taskpad subtask add task-1 "Call the store"
    Add {
        task_id: String,
        title: String,
    },
    /// Edit a subtask's title
    ///
    /// Example: taskpad subtask edit task-1 sub-2 "Call the bakery"
    Edit {
        task_id: String,
        subtask_id: String,
        new_title: String,
    },
    /// Mark a subtask as completed
    ///
    /// Example: taskpad subtask done task-1 sub-2
    Done {
        task_id: String,
        subtask_id: String,
        /// Mark the subtask as not completed instead
        #[arg(long)]
        undo: bool,
    },
    /// Delete a subtask
    ///
    /// Example: taskpad subtask delete task-1 sub-2
    Delete {
        task_id: String,
        subtask_id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Save planner endpoint, deployment name and key
    ///
    /// Example: taskpad settings set --endpoint myres --deployment gpt-4o --key sk-...
    Set {
        #[arg(long)]
        endpoint: String,
        #[arg(long)]
        deployment: String,
        #[arg(long)]
        key: String,
    },
    /// Show the stored settings (key masked)
    Show,
    /// Probe the configured deployment with a minimal request
    Test,
    /// Remove the stored settings
    Clear,
}
