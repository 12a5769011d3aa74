use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;
use todo_core::datetime::local_offset;
use todo_core::error::AppError;
use todo_core::model::Task;

const DISPLAY_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Done")]
    done: &'static str,
    #[tabled(rename = "Text")]
    text: String,
    #[tabled(rename = "Priority")]
    priority: &'static str,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl TaskRow {
    fn from_task(task: &Task) -> Self {
        Self {
            id: task.id,
            done: if task.completed { "x" } else { "" },
            text: task.text.clone(),
            priority: task.priority.as_str(),
            due: task.due_date.map(display_time).unwrap_or_else(|| "-".to_string()),
            created: display_time(task.created_at),
        }
    }
}

/// Local wall-clock time, minutes precision.
pub fn display_time(value: OffsetDateTime) -> String {
    let local = value.to_offset(local_offset());
    local
        .format(DISPLAY_FORMAT)
        .unwrap_or_else(|_| local.to_string())
}

pub fn render_table(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "No todos".to_string();
    }
    let rows: Vec<TaskRow> = tasks.iter().map(TaskRow::from_task).collect();
    Table::new(rows).with(Style::sharp()).to_string()
}

pub fn render_details(task: &Task) -> String {
    let status = if task.completed { "completed" } else { "active" };
    let mut lines = vec![
        format!("#{} {}", task.id, task.text),
        format!("status:   {status}"),
        format!("priority: {}", task.priority),
        format!("created:  {}", display_time(task.created_at)),
    ];
    if let Some(due) = task.due_date {
        lines.push(format!("due:      {}", display_time(due)));
    }
    if let Some(description) = task.description.as_deref() {
        lines.push(format!("\n{description}"));
    }
    lines.join("\n")
}

pub fn print_tasks(tasks: &[Task], json: bool) -> Result<(), AppError> {
    if json {
        println!("{}", to_json(tasks)?);
    } else {
        println!("{}", render_table(tasks));
    }
    Ok(())
}

/// Prints `task` as JSON, or `verb` with its id and text.
pub fn print_task(task: &Task, verb: &str, json: bool) -> Result<(), AppError> {
    if json {
        println!("{}", to_json(task)?);
    } else {
        println!("{verb} todo: {} ({})", task.text, task.id);
    }
    Ok(())
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value).map_err(|err| AppError::invalid_data(err.to_string()))
}
