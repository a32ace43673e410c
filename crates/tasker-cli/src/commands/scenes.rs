//! `tasker scene ...`

use serde::Serialize;
use tabled::Tabled;

use tasker_api::{Scene, SceneAction, TaskerClient};

use crate::cli::{GlobalOpts, SceneCommand};
use crate::error::CliError;
use crate::output::print_rows;

#[derive(Tabled, Serialize)]
struct SceneRow {
    name: String,
    status: String,
    #[tabled(rename = "display as")]
    display_as: String,
    geometry: String,
}

impl From<Scene> for SceneRow {
    fn from(s: Scene) -> Self {
        let geometry = match (s.position(), s.size()) {
            (Some((x, y)), Some((w, h))) => format!("{w}x{h}@{x},{y}"),
            (None, Some((w, h))) => format!("{w}x{h}"),
            _ => String::new(),
        };
        Self {
            name: s.name,
            status: format!("{:?}", s.status).to_lowercase(),
            display_as: s.display_as,
            geometry,
        }
    }
}

pub async fn handle(
    command: SceneCommand,
    client: &TaskerClient,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match command {
        SceneCommand::List => {
            let rows: Vec<SceneRow> = client
                .scenes(None)
                .await?
                .into_iter()
                .map(Into::into)
                .collect();
            print_rows(global.output, &rows)
        }
        SceneCommand::Show { name, display_as } => {
            set(client, global, &name, SceneAction::Show, display_as.as_deref()).await
        }
        SceneCommand::Hide { name } => set(client, global, &name, SceneAction::Hide, None).await,
        SceneCommand::Create { name } => {
            set(client, global, &name, SceneAction::Create, None).await
        }
        SceneCommand::Destroy { name } => {
            set(client, global, &name, SceneAction::Destroy, None).await
        }
    }
}

async fn set(
    client: &TaskerClient,
    global: &GlobalOpts,
    name: &str,
    action: SceneAction,
    display_as: Option<&str>,
) -> Result<(), CliError> {
    let scene = client.set_scene(name, Some(action), display_as).await?;
    print_rows(global.output, &[SceneRow::from(scene)])
}
