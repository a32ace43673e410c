//! `tasker task ...`

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use tasker_api::{TaskerClient, Task};

use crate::cli::{GlobalOpts, RunTaskArgs, TaskCommand};
use crate::error::CliError;
use crate::output::{print_rows, print_value, yes_no};

#[derive(Tabled, Serialize)]
struct TaskRow {
    name: String,
    #[tabled(display_with = "yes_no")]
    running: bool,
}

impl From<Task> for TaskRow {
    fn from(t: Task) -> Self {
        Self {
            name: t.name,
            running: t.running,
        }
    }
}

pub async fn handle(
    command: TaskCommand,
    client: &TaskerClient,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match command {
        TaskCommand::List => {
            let rows: Vec<TaskRow> = client
                .tasks(None)
                .await?
                .into_iter()
                .map(Into::into)
                .collect();
            print_rows(global.output, &rows)
        }
        TaskCommand::Run(args) => run(args, client).await,
    }
}

async fn run(args: RunTaskArgs, client: &TaskerClient) -> Result<(), CliError> {
    let variables: serde_json::Map<String, Value> = args
        .variables
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();

    let output = client
        .run_task(
            &args.name,
            &variables,
            !args.raw,
            args.task_timeout.map(Duration::from_secs),
        )
        .await?;
    print_value(&output)
}
