pub mod cli;
pub mod commands;
pub mod controller;
pub mod render;
pub mod store;
pub mod task;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::info;

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(verbose = cli.verbose, quiet = cli.quiet, "starting tally CLI");

    let data_dir =
        cli::resolve_data_dir(cli.data.as_deref()).context("failed to resolve data directory")?;

    let store = store::SlotStore::open(&data_dir)
        .with_context(|| format!("failed to open slot store at {}", data_dir.display()))?;

    let mut controller = controller::Controller::open(store);
    let mut renderer = render::Renderer::new();
    let inv = cli::Invocation::parse(cli.rest)?;

    commands::dispatch(&mut controller, &mut renderer, inv)?;

    info!("done");
    Ok(())
}
