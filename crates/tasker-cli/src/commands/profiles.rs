//! `tasker profile ...`

use serde::Serialize;
use tabled::Tabled;

use tasker_api::{Profile, TaskerClient};

use crate::cli::{GlobalOpts, ProfileCommand};
use crate::error::CliError;
use crate::output::{print_rows, yes_no};

#[derive(Tabled, Serialize)]
struct ProfileRow {
    name: String,
    #[tabled(display_with = "yes_no")]
    enabled: bool,
    #[tabled(display_with = "yes_no")]
    active: bool,
}

impl From<Profile> for ProfileRow {
    fn from(p: Profile) -> Self {
        Self {
            name: p.name,
            enabled: p.enabled,
            active: p.active,
        }
    }
}

pub async fn handle(
    command: ProfileCommand,
    client: &TaskerClient,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match command {
        ProfileCommand::List => {
            let rows: Vec<ProfileRow> = client
                .profiles(None)
                .await?
                .into_iter()
                .map(Into::into)
                .collect();
            print_rows(global.output, &rows)
        }
        ProfileCommand::On { name } => set(client, global, &name, Some(true)).await,
        ProfileCommand::Off { name } => set(client, global, &name, Some(false)).await,
        ProfileCommand::Toggle { name } => set(client, global, &name, None).await,
    }
}

async fn set(
    client: &TaskerClient,
    global: &GlobalOpts,
    name: &str,
    enabled: Option<bool>,
) -> Result<(), CliError> {
    let profile = client.set_profile(name, enabled).await?;
    print_rows(global.output, &[ProfileRow::from(profile)])
}
