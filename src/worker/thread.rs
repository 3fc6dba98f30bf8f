use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::error::Result;
use crate::registry::Registry;

use super::types::{InterruptHandles, Table, WorkerCmd, WorkerEvent};

fn publish_handles(registry: &Registry, interrupts: &InterruptHandles) {
    if let Ok(mut map) = interrupts.lock() {
        map.clear();
        map.extend(registry.interrupt_handles());
    }
}

fn describe(cmd: &WorkerCmd) -> String {
    match cmd {
        WorkerCmd::Open { name, .. } => format!("open {name}"),
        WorkerCmd::Close { name } => format!("close {name}"),
        WorkerCmd::Refresh { name } => format!("refresh {name}"),
        WorkerCmd::Sync { source, dest } => format!("sync {source} -> {dest}"),
        WorkerCmd::PlanSync { source, dest } => format!("plan {source} -> {dest}"),
        WorkerCmd::Delete { name, .. } => format!("delete from {name}"),
        WorkerCmd::Copy { source, dest, .. } => format!("copy {source} -> {dest}"),
        WorkerCmd::Table { name } => format!("table {name}"),
        WorkerCmd::SetDisplay(_) => "set display".to_string(),
        WorkerCmd::SaveSession { .. } => "save session".to_string(),
        WorkerCmd::RestoreSession { .. } => "restore session".to_string(),
        WorkerCmd::Quit => "quit".to_string(),
    }
}

/// Run one command against the registry, returning the event that answers it.
fn handle(
    registry: &mut Registry,
    interrupts: &InterruptHandles,
    cmd: WorkerCmd,
) -> Result<WorkerEvent> {
    Ok(match cmd {
        WorkerCmd::Open { name, path } => {
            // Published before loading so the first load can be interrupted too.
            let opened = registry.open_with(&name, &path, |opening, token| {
                if let Ok(mut map) = interrupts.lock() {
                    map.insert(opening.to_string(), token);
                }
            })?;
            WorkerEvent::Opened {
                kind: opened.kind(),
                tracks: opened.state().len(),
                name,
            }
        }
        WorkerCmd::Close { name } => {
            registry.close(&name)?;
            WorkerEvent::Closed { name }
        }
        WorkerCmd::Refresh { name } => {
            registry.refresh(&name)?;
            WorkerEvent::Refreshed { name }
        }
        WorkerCmd::Sync { source, dest } => {
            let outcome = registry.sync(&source, &dest)?;
            WorkerEvent::Finished { name: dest, outcome }
        }
        WorkerCmd::PlanSync { source, dest } => {
            let plan = registry.plan(&source, &dest)?;
            WorkerEvent::Plan { source, dest, plan }
        }
        WorkerCmd::Delete { name, keys } => {
            let outcome = registry.delete(&name, &keys)?;
            WorkerEvent::Finished { name, outcome }
        }
        WorkerCmd::Copy { source, dest, keys } => {
            let outcome = registry.copy(&source, &dest, &keys)?;
            WorkerEvent::Finished { name: dest, outcome }
        }
        WorkerCmd::Table { name } => {
            let collection = registry.get(&name).ok_or_else(|| {
                crate::error::CollectionError::UnknownCollection { name: name.clone() }
            })?;
            let table = Table::of(collection.state());
            WorkerEvent::Table { name, table }
        }
        WorkerCmd::SetDisplay(display) => {
            registry.set_display(display);
            WorkerEvent::DisplayChanged
        }
        WorkerCmd::SaveSession { path } => {
            registry.save_session(&path)?;
            WorkerEvent::SessionSaved { path }
        }
        WorkerCmd::RestoreSession { path } => {
            let names = registry.restore_session(&path)?;
            WorkerEvent::SessionRestored { names }
        }
        // Handled by the loop.
        WorkerCmd::Quit => WorkerEvent::Stopped,
    })
}

pub(super) fn spawn_worker_thread(
    mut registry: Registry,
    rx: Receiver<WorkerCmd>,
    events: Sender<WorkerEvent>,
    interrupts: InterruptHandles,
) -> JoinHandle<()> {
    thread::spawn(move || {
        registry.set_events(Arc::new(events.clone()));
        publish_handles(&registry, &interrupts);

        // Ends on Quit or when every sender is gone.
        while let Ok(cmd) = rx.recv() {
            if matches!(cmd, WorkerCmd::Quit) {
                break;
            }
            let what = describe(&cmd);
            debug!("worker: {what}");
            let reply = handle(&mut registry, &interrupts, cmd).unwrap_or_else(|e| {
                warn!("worker: {what} failed: {e}");
                WorkerEvent::Failed {
                    command: what,
                    error: e.to_string(),
                }
            });
            publish_handles(&registry, &interrupts);
            let _ = events.send(reply);
        }

        if let Err(e) = registry.flush_all() {
            warn!("worker: final flush failed: {e}");
        }
        let _ = events.send(WorkerEvent::Stopped);
    })
}
