//! Argument definitions for the `tasker` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "tasker",
    version,
    about = "Control the Tasker Android automation app over its HTTP API",
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config profile to use.
    #[arg(long, short = 'P', global = true)]
    pub profile: Option<String>,

    /// Device address, overriding the profile.
    #[arg(long, short = 'H', global = true)]
    pub host: Option<String>,

    /// Device port, overriding the profile.
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Access token, overriding the profile.
    #[arg(long, global = true, env = "TASKER_API_KEY", hide_env_values = true)]
    pub token: Option<String>,

    /// Request timeout in seconds (floored at the 120 s default).
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Output format.
    #[arg(long, short = 'o', global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the auth handshake and print the obtained token.
    Auth(AuthArgs),

    /// Show aggregate counters and the remote version.
    Stats,

    /// Inspect and switch profiles.
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Inspect and invoke tasks.
    #[command(subcommand)]
    Task(TaskCommand),

    /// Inspect and control scenes.
    #[command(subcommand)]
    Scene(SceneCommand),

    /// Inspect and write global variables.
    #[command(subcommand)]
    Global(GlobalCommand),

    /// Work with the fired-command bus.
    #[command(subcommand)]
    Commands(CommandsCommand),

    /// Import a task definition (Tasker XML).
    Import(ImportArgs),

    /// Fetch or delete files on the device.
    #[command(subcommand)]
    File(FileCommand),

    /// Poll continuously and print snapshot changes and fired commands.
    Watch(WatchArgs),

    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct AuthArgs {
    /// Refresh the currently held token instead of requesting a new one.
    #[arg(long)]
    pub refresh: bool,
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// List profiles.
    List,
    /// Enable a profile.
    On { name: String },
    /// Disable a profile.
    Off { name: String },
    /// Flip a profile's enabled state.
    Toggle { name: String },
}

#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    /// List tasks.
    List,
    /// Invoke a task and print its (normalized) output.
    Run(RunTaskArgs),
}

#[derive(Debug, Args)]
pub struct RunTaskArgs {
    pub name: String,

    /// Task variables as KEY=VALUE (repeatable). `par1`/`par2` are the
    /// positional parameters Tasker exposes to the task.
    #[arg(long = "var", value_parser = parse_key_val)]
    pub variables: Vec<(String, String)>,

    /// Skip the decode cascade and print the raw text output.
    #[arg(long)]
    pub raw: bool,

    /// Per-invocation timeout in seconds (floored at the default).
    #[arg(long = "task-timeout")]
    pub task_timeout: Option<u64>,
}

#[derive(Debug, Subcommand)]
pub enum SceneCommand {
    /// List scenes.
    List,
    /// Show a scene.
    Show {
        name: String,
        /// Display mode, e.g. "Overlay" or "Dialog".
        #[arg(long)]
        display_as: Option<String>,
    },
    /// Hide a scene.
    Hide { name: String },
    /// Create a scene without showing it.
    Create { name: String },
    /// Destroy a scene.
    Destroy { name: String },
}

#[derive(Debug, Subcommand)]
pub enum GlobalCommand {
    /// List global variables.
    List,
    /// Print one global variable.
    Get { name: String },
    /// Write a global variable.
    Set { name: String, value: String },
}

#[derive(Debug, Subcommand)]
pub enum CommandsCommand {
    /// Drain the fired-command log (peek with --keep).
    Drain {
        /// Leave the log intact on the remote.
        #[arg(long)]
        keep: bool,
    },
    /// Push command strings onto the remote command bus.
    Send {
        #[arg(required = true)]
        commands: Vec<String>,
    },
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Path to the Tasker XML export.
    pub path: PathBuf,

    /// Import under this task name instead of the one in the XML.
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum FileCommand {
    /// Fetch a file from the device.
    Get {
        /// Remote path, e.g. "Tasker/backup.xml".
        path: String,
        /// Write to this local path instead of stdout.
        #[arg(long = "out", short = 'O')]
        out: Option<PathBuf>,
    },
    /// Delete a file on the device.
    Rm { path: String },
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Subscribe to these profiles (default: the full remote universe).
    #[arg(long = "profile-name")]
    pub profiles: Vec<String>,

    /// Subscribe to these tasks.
    #[arg(long = "task-name")]
    pub tasks: Vec<String>,

    /// Subscribe to these scenes.
    #[arg(long = "scene-name")]
    pub scenes: Vec<String>,

    /// Subscribe to these global variables.
    #[arg(long = "global-name")]
    pub globals: Vec<String>,

    /// Poll interval in seconds.
    #[arg(long)]
    pub interval: Option<u64>,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))
}
