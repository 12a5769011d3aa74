use clap::{CommandFactory, Parser};
use std::io::{self, BufRead, Write};
use todo_cli::backend::{LocalBackend, RemoteBackend, TodoBackend};
use todo_cli::cli::{Cli, Command, check_session_flags, collect_overrides};
use todo_cli::output::{print_task, print_tasks, render_details};
use todo_cli::session::Session;
use todo_core::config::{Config, load_config_with_fallback, merge_overrides};
use todo_core::datetime::{format_rfc3339, parse_due_date};
use todo_core::error::AppError;
use todo_core::wire::{CreateTodoRequest, UpdateTodoRequest};

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::validation(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(std::mem::take(&mut current));
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::validation("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

/// Due dates are read in the client's local offset and sent as RFC 3339.
fn normalize_due(raw: &str) -> Result<String, AppError> {
    format_rfc3339(parse_due_date(raw)?)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn run_command(
    session: &mut Session,
    command: Command,
    json: bool,
    config: &Config,
) -> Result<(), AppError> {
    match command {
        Command::Add {
            text,
            description,
            due,
            priority,
        } => {
            let request = CreateTodoRequest {
                text,
                description,
                due_date: due.as_deref().map(normalize_due).transpose()?,
                priority,
            };
            let task = session.add(request)?;
            print_task(&task, "Added", json)?;
        }
        Command::List {
            filter,
            sort,
            refresh,
        } => {
            let filter = filter.unwrap_or_else(|| config.filter());
            let sort = sort.unwrap_or_else(|| config.sort());
            let tasks = session.view(filter, sort, refresh)?;
            print_tasks(&tasks, json)?;
        }
        Command::Toggle { id } => {
            let task = session.toggle(id)?;
            let verb = if task.completed { "Completed" } else { "Reopened" };
            print_task(&task, verb, json)?;
        }
        Command::Edit {
            id,
            text,
            description,
            due,
            clear_due,
            priority,
            completed,
        } => {
            let due_date = match (due, clear_due) {
                (Some(raw), _) => Some(Some(normalize_due(&raw)?)),
                (None, true) => Some(None),
                (None, false) => None,
            };
            let request = UpdateTodoRequest {
                text,
                description: description.map(Some),
                completed,
                due_date,
                priority,
            };
            if request.clone().into_patch()?.is_empty() {
                return Err(AppError::validation("edit needs at least one field to change"));
            }
            let task = session.update(id, request)?;
            print_task(&task, "Updated", json)?;
        }
        Command::Delete { id } => {
            session.delete(id)?;
            if json {
                println!("{}", serde_json::json!({ "deleted": id }));
            } else {
                println!("Deleted todo: {id}");
            }
        }
        Command::Show { id } => {
            let task = session.show(id)?;
            if json {
                print_task(&task, "Found", true)?;
            } else {
                println!("{}", render_details(&task));
            }
        }
    }

    Ok(())
}

fn run_interactive<R: BufRead>(
    session: &mut Session,
    launch: &Cli,
    config: &Config,
    mut input: R,
) -> Result<(), AppError> {
    println!("todo ({}), type 'help' for commands, 'exit' to leave", session.describe());
    if let Err(err) = session.refresh() {
        eprintln!("ERROR: {err}");
    }

    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
            break;
        }

        if trimmed == "help" || trimmed == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(trimmed) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {err}");
                continue;
            }
        };

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("todo".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if let Err(err) = check_session_flags(&cli, launch) {
            eprintln!("ERROR: {err}");
            continue;
        }

        let json = cli.json || launch.json;
        let Some(command) = cli.command else {
            continue;
        };

        if let Err(err) = run_command(session, command, json, config) {
            eprintln!("ERROR: {err}");
        }
    }

    Ok(())
}

fn init_tracing(config: &Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level("warn")));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
}

fn open_backend(cli: &Cli, config: &Config) -> Result<Box<dyn TodoBackend>, AppError> {
    if cli.local {
        Ok(Box::new(LocalBackend::open(config.store_path.as_deref())?))
    } else {
        Ok(Box::new(RemoteBackend::new(config.server_url())))
    }
}

fn run(mut cli: Cli) -> Result<(), AppError> {
    let loaded = load_config_with_fallback();
    let config = merge_overrides(&loaded.config, &collect_overrides(&cli)?);
    init_tracing(&config);

    if let Some(err) = loaded.error {
        tracing::warn!(error = %err, "ignoring config file, using defaults");
    }

    let backend = open_backend(&cli, &config)?;
    tracing::debug!(backend = %backend.describe(), "opened backend");
    let mut session = Session::new(backend);

    match cli.command.take() {
        Some(command) => run_command(&mut session, command, cli.json, &config),
        None => run_interactive(&mut session, &cli, &config, io::stdin().lock()),
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => {
            let _ = err.print();
            return;
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run(cli) {
        eprintln!("ERROR: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::split_command_line;

    #[test]
    fn split_keeps_quoted_text_together() {
        let args = split_command_line(r#"add "Buy oat milk" --priority high"#).unwrap();
        assert_eq!(args, vec!["add", "Buy oat milk", "--priority", "high"]);
    }

    #[test]
    fn split_handles_escaped_quotes() {
        let args = split_command_line(r#"edit 1 --text "say \"hi\"""#).unwrap();
        assert_eq!(args, vec!["edit", "1", "--text", r#"say "hi""#]);
    }

    #[test]
    fn split_rejects_unterminated_quote() {
        let err = split_command_line(r#"add "oops"#).unwrap_err();
        assert_eq!(err.code(), "validation_error");
    }
}
