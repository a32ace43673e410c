//! `tasker watch` -- run the poll coordinator in the foreground.

use std::time::Duration;

use owo_colors::OwoColorize;

use tasker_core::{Category, LinkConfig, LinkState, PollCoordinator, Snapshot};

use crate::cli::WatchArgs;
use crate::error::CliError;

pub async fn handle(args: WatchArgs, mut link: LinkConfig) -> Result<(), CliError> {
    if let Some(secs) = args.interval {
        link.poll_interval = Duration::from_secs(secs);
    }

    let coordinator = PollCoordinator::new(link)?;
    coordinator.bootstrap().await?;

    if let Some(device) = coordinator.device() {
        eprintln!(
            "watching {} {} ({})",
            device.manufacturer,
            device.model,
            device.name.as_deref().unwrap_or(&device.android_id),
        );
    }

    subscribe(&coordinator, Category::Profiles, &args.profiles);
    subscribe(&coordinator, Category::Tasks, &args.tasks);
    subscribe(&coordinator, Category::Scenes, &args.scenes);
    subscribe(&coordinator, Category::Globals, &args.globals);

    let mut commands = coordinator.commands();

    let first = coordinator.refresh().await?;
    print_summary(&first, coordinator.state());

    let mut ticker = tokio::time::interval(coordinator.config().poll_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                match coordinator.refresh().await {
                    Ok(snapshot) => print_summary(&snapshot, coordinator.state()),
                    Err(e) if e.is_auth() => {
                        coordinator.shutdown().await;
                        return Err(e.into());
                    }
                    Err(e) => {
                        eprintln!("{} {e}", "degraded".yellow());
                    }
                }
            }
            fired = commands.recv() => {
                if let Ok(command) = fired {
                    println!(
                        "{} {} {}",
                        "command".cyan(),
                        command.prefix.bold(),
                        command.params.join(" "),
                    );
                }
            }
        }
    }

    coordinator.shutdown().await;
    Ok(())
}

/// Subscribe explicit names, or the whole remote universe when none
/// were given.
fn subscribe(coordinator: &PollCoordinator, category: Category, names: &[String]) {
    if names.is_empty() {
        for name in coordinator.universe(category) {
            coordinator.subscribe(category, name);
        }
    } else {
        for name in names {
            coordinator.subscribe(category, name.clone());
        }
    }
}

fn print_summary(snapshot: &Snapshot, state: LinkState) {
    let marker = match state {
        LinkState::Connected => "✓".green().to_string(),
        LinkState::Degraded => "~".yellow().to_string(),
        LinkState::AuthExpired => "✗".red().to_string(),
        LinkState::Idle => "-".to_string(),
    };
    println!(
        "{} {} v{} profiles {}/{} tasks {} scenes {} globals {} commands {}",
        marker,
        snapshot.refreshed_at.format("%H:%M:%S"),
        snapshot.stats.version,
        snapshot.stats.active_profiles,
        snapshot.profiles.len(),
        snapshot.tasks.len(),
        snapshot.scenes.len(),
        snapshot.globals.len(),
        snapshot.commands.len(),
    );
}
