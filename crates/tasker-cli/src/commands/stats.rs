//! `tasker stats`

use serde::Serialize;
use tabled::Tabled;

use tasker_api::TaskerClient;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::print_rows;

#[derive(Tabled, Serialize)]
struct StatsRow {
    version: String,
    #[tabled(rename = "profiles (active)")]
    profiles: String,
    tasks: u32,
    scenes: u32,
    globals: u32,
}

pub async fn handle(client: &TaskerClient, global: &GlobalOpts) -> Result<(), CliError> {
    let stats = client.stats().await?;
    let row = StatsRow {
        version: stats.version.clone(),
        profiles: format!("{} ({})", stats.total_profiles, stats.active_profiles),
        tasks: stats.total_tasks,
        scenes: stats.total_scenes,
        globals: stats.total_globals,
    };
    print_rows(global.output, &[row])
}
