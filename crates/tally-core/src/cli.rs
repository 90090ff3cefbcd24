use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::{ArgAction, Parser};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tally",
    version,
    about = "Tally: a local task-list keeper",
    disable_help_subcommand = true,
    arg_required_else_help = false
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    #[arg(long = "data")]
    pub data: Option<PathBuf>,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub rest: Vec<OsString>,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// One parsed user intent: a command name plus its trailing arguments.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// An empty invocation defaults to `list`.
    pub fn parse(rest: Vec<OsString>) -> anyhow::Result<Self> {
        let mut words = Vec::with_capacity(rest.len());
        for os in rest {
            let word = os
                .into_string()
                .map_err(|bad| anyhow!("argument is not valid UTF-8: {bad:?}"))?;
            words.push(word);
        }

        let mut iter = words.into_iter();
        let command = iter.next().unwrap_or_else(|| "list".to_string());
        let args: Vec<String> = iter.collect();

        debug!(command = %command, args = ?args, "parsed invocation");
        Ok(Self { command, args })
    }
}

/// `--data` wins; otherwise the platform data directory gets a `tally`
/// subdirectory.
pub fn resolve_data_dir(override_dir: Option<&std::path::Path>) -> anyhow::Result<PathBuf> {
    let dir = if let Some(path) = override_dir {
        path.to_path_buf()
    } else {
        dirs::data_dir()
            .context("could not determine a platform data directory; pass --data")?
            .join("tally")
    };

    if !dir.exists() {
        info!(dir = %dir.display(), "creating data directory");
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    Ok(dir)
}
