use clap::{CommandFactory, Parser};
use std::future::Future;
use std::io::{self, BufRead};
use std::path::PathBuf;
use taskpad_cli::cli::{Cli, Command, ListCommand, SettingsCommand, SubtaskCommand};
use taskpad_core::error::AppError;
use taskpad_core::icon::subtask_icon;
use taskpad_core::model::{Subtask, Task};
use taskpad_core::planner::{PlanError, PlanTracker, PlannerClient};
use taskpad_core::settings::{self, Settings};
use taskpad_core::storage::json_store;
use taskpad_core::store::TaskStore;

fn data_dir() -> Result<PathBuf, AppError> {
    json_store::data_dir()
}

fn open_store() -> Result<TaskStore, AppError> {
    TaskStore::open(&data_dir()?)
}

fn task_not_found() -> AppError {
    AppError::invalid_input("task not found")
}

fn subtask_not_found() -> AppError {
    AppError::invalid_input("subtask not found")
}

fn to_json(value: &impl serde::Serialize) -> Result<String, AppError> {
    serde_json::to_string(value).map_err(|err| AppError::encode(err.to_string()))
}

fn print_task_line(task: &Task) {
    let mark = if task.completed { "x" } else { " " };
    println!("[{mark}] {} | {}", task.id, task.title);
    for subtask in &task.subtasks {
        print_subtask_line(subtask);
    }
}

fn print_subtask_line(subtask: &Subtask) {
    let mark = if subtask.completed { "x" } else { " " };
    println!(
        "    [{mark}] ({}) {} | {}",
        subtask_icon(&subtask.title),
        subtask.id,
        subtask.title
    );
}

fn print_archived_line(task: &Task) {
    let archived_at = task.archived_at.as_deref().unwrap_or("-");
    println!("[x] {} | {} | archived {}", task.id, task.title, archived_at);
}

fn mask_key(key: &str) -> String {
    if key.is_empty() {
        return "-".to_string();
    }
    let count = key.chars().count();
    if count > 4 {
        let tail: String = key.chars().skip(count - 4).collect();
        format!("...{tail}")
    } else {
        "...".to_string()
    }
}

fn block_on<F: Future>(future: F) -> Result<F::Output, AppError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::io(err.to_string()))?;
    Ok(runtime.block_on(future))
}

/// Remote failures surface as a generic retryable notice; the diagnostic
/// detail goes to the log only.
fn plan_failure(err: PlanError) -> AppError {
    match err {
        PlanError::Configuration => AppError::invalid_input(
            "planner settings are incomplete, run 'taskpad settings set' first",
        ),
        PlanError::InFlight => {
            AppError::invalid_input("a plan request for this task is already running")
        }
        other => {
            log::error!("planner call failed: {other}");
            AppError::io("the planner request failed, please try again")
        }
    }
}

fn run_plan(cli_json: bool, id: &str, tracker: &PlanTracker) -> Result<(), AppError> {
    let dir = data_dir()?;
    let mut store = TaskStore::open(&dir)?;
    let task = store.find_active(id).cloned().ok_or_else(task_not_found)?;

    let stored = settings::load(&dir);
    let client = PlannerClient::from_settings(&stored).map_err(plan_failure)?;

    let _ticket = tracker.begin(&task.id).map_err(plan_failure)?;
    let titles = block_on(client.plan_subtasks(&task.title))?.map_err(plan_failure)?;

    let mut added = Vec::new();
    for title in &titles {
        if let Some(subtask) = store.add_subtask(&task.id, title)? {
            added.push(subtask);
        }
    }

    if cli_json {
        println!("{}", to_json(&added)?);
    } else {
        println!("Planned {} subtasks for: {} ({})", added.len(), task.title, task.id);
        for subtask in &added {
            print_subtask_line(subtask);
        }
    }

    Ok(())
}

fn run_settings(cli_json: bool, command: SettingsCommand) -> Result<(), AppError> {
    let dir = data_dir()?;
    match command {
        SettingsCommand::Set {
            endpoint,
            deployment,
            key,
        } => {
            let record = Settings {
                endpoint,
                deployment_name: deployment,
                key,
            };
            if !settings::save(&dir, &record) {
                return Err(AppError::io("failed to save settings"));
            }
            let saved = settings::load(&dir);
            if cli_json {
                println!(
                    "{}",
                    serde_json::json!({
                        "endpoint": saved.endpoint,
                        "deploymentName": saved.deployment_name,
                        "keySet": !saved.key.is_empty(),
                    })
                );
            } else {
                println!("Settings saved. Endpoint: {}", saved.endpoint);
            }
        }
        SettingsCommand::Show => {
            let saved = settings::load(&dir);
            if cli_json {
                println!(
                    "{}",
                    serde_json::json!({
                        "endpoint": saved.endpoint,
                        "deploymentName": saved.deployment_name,
                        "keySet": !saved.key.is_empty(),
                    })
                );
            } else {
                let endpoint = if saved.endpoint.is_empty() { "-" } else { &saved.endpoint };
                let deployment = if saved.deployment_name.is_empty() {
                    "-"
                } else {
                    &saved.deployment_name
                };
                println!("endpoint:   {endpoint}");
                println!("deployment: {deployment}");
                println!("key:        {}", mask_key(&saved.key));
            }
        }
        SettingsCommand::Test => {
            let saved = settings::load(&dir);
            let client = PlannerClient::from_settings(&saved).map_err(plan_failure)?;
            block_on(client.test_connection())?.map_err(plan_failure)?;
            if cli_json {
                println!("{}", serde_json::json!({ "ok": true }));
            } else {
                println!("Connection successful.");
            }
        }
        SettingsCommand::Clear => {
            settings::clear(&dir);
            if cli_json {
                println!("{}", serde_json::json!({ "cleared": true }));
            } else {
                println!("Settings cleared.");
            }
        }
    }

    Ok(())
}

fn run_subtask(cli_json: bool, command: SubtaskCommand) -> Result<(), AppError> {
    let mut store = open_store()?;
    match command {
        SubtaskCommand::Add { task_id, title } => {
            let trimmed = title.trim();
            if trimmed.is_empty() {
                return Err(AppError::invalid_input("title is required"));
            }
            let subtask = store
                .add_subtask(&task_id, trimmed)?
                .ok_or_else(task_not_found)?;
            if cli_json {
                println!("{}", to_json(&subtask)?);
            } else {
                println!("Added subtask: {} ({})", subtask.title, subtask.id);
            }
        }
        SubtaskCommand::Edit {
            task_id,
            subtask_id,
            new_title,
        } => {
            if !store.set_subtask_title(&task_id, &subtask_id, new_title.trim())? {
                return Err(subtask_not_found());
            }
            if cli_json {
                println!("{}", serde_json::json!({ "id": subtask_id, "title": new_title.trim() }));
            } else {
                println!("Updated subtask: {subtask_id}");
            }
        }
        SubtaskCommand::Done {
            task_id,
            subtask_id,
            undo,
        } => {
            if !store.set_subtask_completed(&task_id, &subtask_id, !undo)? {
                return Err(subtask_not_found());
            }
            if cli_json {
                println!("{}", serde_json::json!({ "id": subtask_id, "completed": !undo }));
            } else if undo {
                println!("Reopened subtask: {subtask_id}");
            } else {
                println!("Completed subtask: {subtask_id}");
            }
        }
        SubtaskCommand::Delete { task_id, subtask_id } => {
            if !store.delete_subtask(&task_id, &subtask_id)? {
                return Err(subtask_not_found());
            }
            if cli_json {
                println!("{}", serde_json::json!({ "id": subtask_id, "deleted": true }));
            } else {
                println!("Deleted subtask: {subtask_id}");
            }
        }
    }

    Ok(())
}

fn run_command(cli: Cli, tracker: &PlanTracker) -> Result<(), AppError> {
    match cli.command {
        Command::Add { title } => {
            let title = match title {
                Some(value) if !value.trim().is_empty() => value,
                _ => return Err(AppError::invalid_input("title is required")),
            };
            let mut store = open_store()?;
            let task = store.add_task(&title)?;
            if cli.json {
                println!("{}", to_json(&task)?);
            } else {
                println!("Added task: {} ({})", task.title, task.id);
            }
        }
        Command::Edit { id, new_title } => {
            let mut store = open_store()?;
            if !store.set_task_title(&id, new_title.trim())? {
                return Err(task_not_found());
            }
            if cli.json {
                println!("{}", serde_json::json!({ "id": id, "title": new_title.trim() }));
            } else {
                println!("Updated task: {id}");
            }
        }
        Command::Delete { id } => {
            let mut store = open_store()?;
            if !store.delete_task(&id)? {
                return Err(task_not_found());
            }
            if cli.json {
                println!("{}", serde_json::json!({ "id": id, "deleted": true }));
            } else {
                println!("Deleted task: {id}");
            }
        }
        Command::Done { id, undo } => {
            let mut store = open_store()?;
            if !store.set_task_completed(&id, !undo)? {
                return Err(task_not_found());
            }
            if cli.json {
                println!("{}", serde_json::json!({ "id": id, "completed": !undo }));
            } else if undo {
                println!("Reopened task: {id}");
            } else {
                println!("Completed task: {id}");
                println!("Run 'taskpad archive {id}' to move it to the archive.");
            }
        }
        Command::Archive { id } => {
            let mut store = open_store()?;
            if !store.archive_task(&id)? {
                return Err(task_not_found());
            }
            if cli.json {
                println!("{}", serde_json::json!({ "id": id, "archived": true }));
            } else {
                println!("Archived task: {id}");
            }
        }
        Command::Show { id } => {
            let store = open_store()?;
            let task = store.find_task(&id).ok_or_else(task_not_found)?;
            if cli.json {
                println!("{}", to_json(task)?);
            } else if task.is_archived() {
                print_archived_line(task);
                for subtask in &task.subtasks {
                    print_subtask_line(subtask);
                }
            } else {
                print_task_line(task);
            }
        }
        Command::List { list } => {
            let store = open_store()?;
            match list {
                ListCommand::Active => {
                    if cli.json {
                        println!("{}", to_json(&store.active())?);
                    } else {
                        for task in store.active() {
                            print_task_line(task);
                        }
                    }
                }
                ListCommand::Archive => {
                    if cli.json {
                        println!("{}", to_json(&store.archived())?);
                    } else {
                        for task in store.archived() {
                            print_archived_line(task);
                        }
                    }
                }
            }
        }
        Command::Subtask { subtask } => run_subtask(cli.json, subtask)?,
        Command::Plan { id } => run_plan(cli.json, &id, tracker)?,
        Command::Settings { settings } => run_settings(cli.json, settings)?,
    }

    Ok(())
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        match ch {
            _ if escape => {
                if ch != '"' && ch != '\\' {
                    current.push('\\');
                }
                current.push(ch);
                escape = false;
            }
            '\\' if in_quotes => escape = true,
            '"' => in_quotes = !in_quotes,
            _ if ch.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }
    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn run_interactive() -> Result<(), AppError> {
    let tracker = PlanTracker::new();
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;
        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }
        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };
        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("taskpad".to_string());
        argv.extend(args);

        match Cli::try_parse_from(argv) {
            Ok(cli) => {
                if let Err(err) = run_command(cli, &tracker) {
                    eprintln!("ERROR: {}", err);
                }
            }
            Err(err) => eprintln!("ERROR: {}", normalize_parse_error(err)),
        }
    }

    Ok(())
}

fn main() {
    env_logger::init();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive() {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    let tracker = PlanTracker::new();
    if let Err(err) = run_command(cli, &tracker) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
