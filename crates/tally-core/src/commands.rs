use std::io::{self, Write};

use anyhow::{anyhow, bail};
use tracing::{debug, info, instrument};

use crate::cli::Invocation;
use crate::controller::{Controller, Snapshot};
use crate::render::{Renderer, short_id};

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "add", "list", "done", "edit", "delete", "clear", "theme", "export", "help", "version",
    ]
}

/// Expands a unique prefix of a known command name, Taskwarrior-style:
/// `del` resolves to `delete`, but an ambiguous prefix stays unresolved.
pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(controller, renderer, inv))]
pub fn dispatch(
    controller: &mut Controller,
    renderer: &mut Renderer,
    inv: Invocation,
) -> anyhow::Result<()> {
    let known = known_command_names();
    let command = expand_command_abbrev(inv.command.as_str(), &known)
        .ok_or_else(|| anyhow!("unknown command: {}", inv.command))?;

    debug!(command, args = ?inv.args, "dispatching command");

    match command {
        "add" => cmd_add(controller, &inv.args),
        "list" => cmd_list(controller, renderer),
        "done" => cmd_done(controller, &inv.args),
        "edit" => cmd_edit(controller, &inv.args),
        "delete" => cmd_delete(controller, &inv.args),
        "clear" => cmd_clear(controller),
        "theme" => cmd_theme(controller),
        "export" => cmd_export(controller),
        "help" => cmd_help(),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

/// Resolves a full id or a unique id prefix against the current snapshot.
/// The controller itself treats unknown ids as no-ops; at the CLI boundary
/// a miss or an ambiguous prefix is worth an error the user can act on.
fn resolve_task_id(snapshot: &Snapshot, prefix: &str) -> anyhow::Result<String> {
    if prefix.is_empty() {
        bail!("expected a task id or id prefix");
    }

    let mut matches = snapshot
        .tasks
        .iter()
        .filter(|task| task.id.starts_with(prefix));
    let first = matches
        .next()
        .ok_or_else(|| anyhow!("no task matches id prefix: {prefix}"))?;
    if matches.next().is_some() {
        bail!("id prefix is ambiguous: {prefix}");
    }
    Ok(first.id.clone())
}

#[instrument(skip(controller, args))]
fn cmd_add(controller: &mut Controller, args: &[String]) -> anyhow::Result<()> {
    info!("command add");

    let before = controller.snapshot().tasks.len();
    let snapshot = controller.add_task(&args.join(" "));

    if snapshot.tasks.len() == before {
        println!("Nothing added: title can't be empty.");
        return Ok(());
    }

    // The new task is always prepended.
    let id = snapshot
        .tasks
        .first()
        .map(|task| short_id(&task.id))
        .unwrap_or_default();
    println!("Added task {id}.");
    Ok(())
}

#[instrument(skip(controller, renderer))]
fn cmd_list(controller: &mut Controller, renderer: &mut Renderer) -> anyhow::Result<()> {
    info!("command list");
    renderer.print_snapshot(&controller.snapshot())
}

#[instrument(skip(controller, args))]
fn cmd_done(controller: &mut Controller, args: &[String]) -> anyhow::Result<()> {
    info!("command done");

    let prefix = args.first().map(String::as_str).unwrap_or_default();
    let id = resolve_task_id(&controller.snapshot(), prefix)?;
    let snapshot = controller.toggle_completed(&id);

    let completed = snapshot
        .tasks
        .iter()
        .find(|task| task.id == id)
        .map(|task| task.completed)
        .unwrap_or(false);
    println!(
        "Task {} marked {}.",
        short_id(&id),
        if completed { "done" } else { "not done" }
    );
    Ok(())
}

#[instrument(skip(controller, args))]
fn cmd_edit(controller: &mut Controller, args: &[String]) -> anyhow::Result<()> {
    info!("command edit");

    let prefix = args.first().map(String::as_str).unwrap_or_default();
    let id = resolve_task_id(&controller.snapshot(), prefix)?;
    if args.len() < 2 {
        bail!("edit requires replacement text");
    }

    controller.start_edit(&id);
    controller.update_draft(&args[1..].join(" "));
    let snapshot = controller.save_edit();

    if snapshot.editing_id.is_some() {
        // Empty replacement was rejected; discard the session on the way out.
        controller.cancel_edit();
        println!("Task {} unchanged: title can't be empty.", short_id(&id));
        return Ok(());
    }

    println!("Task {} retitled.", short_id(&id));
    Ok(())
}

#[instrument(skip(controller, args))]
fn cmd_delete(controller: &mut Controller, args: &[String]) -> anyhow::Result<()> {
    info!("command delete");

    let prefix = args.first().map(String::as_str).unwrap_or_default();
    let id = resolve_task_id(&controller.snapshot(), prefix)?;
    controller.delete_task(&id);
    println!("Deleted task {}.", short_id(&id));
    Ok(())
}

#[instrument(skip(controller))]
fn cmd_clear(controller: &mut Controller) -> anyhow::Result<()> {
    info!("command clear");

    let before = controller.snapshot().tasks.len();
    let snapshot = controller.clear_completed();
    println!("Cleared {} completed task(s).", before - snapshot.tasks.len());
    Ok(())
}

#[instrument(skip(controller))]
fn cmd_theme(controller: &mut Controller) -> anyhow::Result<()> {
    info!("command theme");

    let snapshot = controller.toggle_theme();
    println!("Theme is now {}.", snapshot.theme.as_str());
    Ok(())
}

#[instrument(skip(controller))]
fn cmd_export(controller: &mut Controller) -> anyhow::Result<()> {
    info!("command export");

    let snapshot = controller.snapshot();
    let mut out = io::stdout().lock();
    let payload = serde_json::to_string_pretty(&snapshot.tasks)?;
    writeln!(out, "{payload}")?;
    Ok(())
}

fn cmd_help() -> anyhow::Result<()> {
    println!("usage: tally [-v|-q] [--data DIR] <command> [args]");
    println!();
    println!("commands:");
    println!("  add <text>         create a task (newest first)");
    println!("  list               show the task table (default)");
    println!("  done <id>          toggle a task's completed flag");
    println!("  edit <id> <text>   replace a task's title");
    println!("  delete <id>        remove a task");
    println!("  clear              remove all completed tasks");
    println!("  theme              flip the light/dark preference");
    println!("  export             print tasks as JSON");
    println!("  help, version");
    println!();
    println!("ids may be abbreviated to any unique prefix.");
    Ok(())
}
