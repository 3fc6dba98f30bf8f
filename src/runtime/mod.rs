use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fs;
use std::io::{self, IsTerminal, Stderr};
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use clap::Parser;
use tracing::{debug, info};

use crate::device::DeviceDatabase;
use crate::job::JobOutcome;
use crate::logging;
use crate::registry::Registry;
use crate::track::LoftyTagReader;
use crate::worker::{Table, Worker, WorkerCmd, WorkerEvent};

mod cli;
mod keys;
mod progress;
mod settings;

pub use cli::{Cli, Command, parse_columns};
pub use progress::{Progress, bar, status_line};

type AnyResult<T> = Result<T, Box<dyn Error>>;

const TICK: Duration = Duration::from_millis(50);

pub fn run() -> AnyResult<()> {
    let cli = Cli::parse();
    let mut settings = settings::load_settings();
    cli.apply(&mut settings)?;
    logging::init(&settings.logging);

    if let Command::InitDevice { mount } = &cli.command {
        DeviceDatabase::create(mount)?;
        println!("initialised device layout under {}", mount.display());
        return Ok(());
    }

    let session = settings.state.session_path.clone();
    let worker = Worker::new(Registry::new(settings, Arc::new(LoftyTagReader)));
    let mut console = Console::new(&worker);

    let result = (|| -> AnyResult<()> {
        let restored = match &session {
            Some(path) if path.exists() => console.restore(path)?,
            _ => HashSet::new(),
        };

        match &cli.command {
            Command::List { path } => {
                let name = console.ensure_open(path, &restored)?;
                let table = console.table(&name)?;
                print!("{}", format_table(&table));
            }
            Command::Info { path } => {
                let name = console.ensure_open(path, &restored)?;
                let table = console.table(&name)?;
                println!("path:   {name}");
                println!("kind:   {}", console.kind_of(&name));
                println!("tracks: {}", table.keys.len());
            }
            Command::Sync {
                source,
                dest,
                dry_run,
            } => {
                let source = console.ensure_open(source, &restored)?;
                let dest = console.ensure_open(dest, &restored)?;
                if *dry_run {
                    console.dry_run(&source, &dest)?;
                } else {
                    console.sync(&source, &dest)?;
                }
            }
            Command::InitDevice { .. } => {}
        }

        if let Some(path) = &session {
            console.request(WorkerCmd::SaveSession { path: path.clone() }, None)?;
        }
        Ok(())
    })();

    worker.quit();
    result
}

/// Stable collection name for a path: its canonical form when it exists.
pub fn collection_name(path: &Path) -> String {
    fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

/// Left-aligned columns separated by two spaces, header first.
pub fn format_table(table: &Table) -> String {
    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.chars().count()).collect();
    for row in &table.rows {
        for (i, cell) in row.iter().enumerate() {
            let w = cell.chars().count();
            match widths.get_mut(i) {
                Some(slot) => *slot = (*slot).max(w),
                None => widths.push(w),
            }
        }
    }

    let mut out = String::new();
    for row in std::iter::once(&table.headers).chain(table.rows.iter()) {
        let mut line = String::new();
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                line.push_str("  ");
            }
            line.push_str(cell);
            let pad = widths[i].saturating_sub(cell.chars().count());
            line.extend(std::iter::repeat_n(' ', pad));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Human label for each key of a table: its visible cells joined.
fn labels(table: &Table) -> HashMap<String, String> {
    table
        .keys
        .iter()
        .zip(&table.rows)
        .map(|(key, row)| (key.clone(), row.join(" - ")))
        .collect()
}

/// Drives the worker from the main thread and paints progress while it works.
struct Console<'a> {
    worker: &'a Worker,
    progress: Progress<Stderr>,
    show_progress: bool,
    interactive: bool,
    kinds: HashMap<String, String>,
}

impl<'a> Console<'a> {
    fn new(worker: &'a Worker) -> Self {
        let show_progress = io::stderr().is_terminal();
        Self {
            worker,
            progress: Progress::new(io::stderr()),
            show_progress,
            interactive: show_progress && io::stdin().is_terminal(),
            kinds: HashMap::new(),
        }
    }

    /// Send `cmd` and wait for its answer. A quit key interrupts `target`.
    fn request(&mut self, cmd: WorkerCmd, target: Option<&str>) -> AnyResult<WorkerEvent> {
        self.worker
            .send(cmd)
            .map_err(|_| "worker thread is gone")?;

        let keys = if self.interactive && target.is_some() {
            keys::KeyWatch::enable()
        } else {
            None
        };

        loop {
            if let Some(watch) = &keys {
                if watch.quit_requested()? {
                    if let Some(name) = target {
                        info!("interrupting {name}");
                        self.worker.interrupt(name);
                    }
                }
            }

            match self.worker.recv_timeout(TICK) {
                Ok(WorkerEvent::Collection(event)) => {
                    if self.show_progress {
                        self.progress.handle(&event)?;
                    }
                }
                Ok(WorkerEvent::Failed { command, error }) => {
                    self.progress.clear()?;
                    return Err(format!("{command}: {error}").into());
                }
                Ok(other) => {
                    self.progress.clear()?;
                    return Ok(other);
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    self.progress.clear()?;
                    return Err("worker thread stopped".into());
                }
            }
        }
    }

    fn restore(&mut self, path: &Path) -> AnyResult<HashSet<String>> {
        let reply = self.request(
            WorkerCmd::RestoreSession {
                path: path.to_path_buf(),
            },
            None,
        )?;
        match reply {
            WorkerEvent::SessionRestored { names } => {
                debug!("restored {} collection(s) from {}", names.len(), path.display());
                Ok(names.into_iter().collect())
            }
            other => Err(format!("unexpected reply {other:?}").into()),
        }
    }

    /// Open `path`, or bring a restored collection of the same name up to date.
    fn ensure_open(&mut self, path: &Path, restored: &HashSet<String>) -> AnyResult<String> {
        let name = collection_name(path);
        if restored.contains(&name) {
            self.request(WorkerCmd::Refresh { name: name.clone() }, Some(&name))?;
            return Ok(name);
        }

        let reply = self.request(
            WorkerCmd::Open {
                name: name.clone(),
                path: path.to_path_buf(),
            },
            Some(&name),
        )?;
        if let WorkerEvent::Opened { kind, tracks, .. } = reply {
            debug!("opened {name} as {kind} with {tracks} track(s)");
            self.kinds.insert(name.clone(), kind.to_string());
        }
        Ok(name)
    }

    fn kind_of(&self, name: &str) -> String {
        match self.kinds.get(name) {
            Some(kind) => kind.clone(),
            None => crate::registry::detect_kind(Path::new(name))
                .map(|k| k.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }

    fn table(&mut self, name: &str) -> AnyResult<Table> {
        match self.request(WorkerCmd::Table { name: name.to_string() }, None)? {
            WorkerEvent::Table { table, .. } => Ok(table),
            other => Err(format!("unexpected reply {other:?}").into()),
        }
    }

    fn dry_run(&mut self, source: &str, dest: &str) -> AnyResult<()> {
        let plan = match self.request(
            WorkerCmd::PlanSync {
                source: source.to_string(),
                dest: dest.to_string(),
            },
            None,
        )? {
            WorkerEvent::Plan { plan, .. } => plan,
            other => return Err(format!("unexpected reply {other:?}").into()),
        };

        let dest_labels = labels(&self.table(dest)?);
        let source_labels = labels(&self.table(source)?);
        for key in &plan.to_delete {
            println!("delete  {}", dest_labels.get(key).unwrap_or(key));
        }
        for key in &plan.to_copy {
            println!("copy    {}", source_labels.get(key).unwrap_or(key));
        }
        println!(
            "{} to delete, {} to copy",
            plan.to_delete.len(),
            plan.to_copy.len()
        );
        Ok(())
    }

    fn sync(&mut self, source: &str, dest: &str) -> AnyResult<()> {
        let reply = self.request(
            WorkerCmd::Sync {
                source: source.to_string(),
                dest: dest.to_string(),
            },
            Some(dest),
        )?;
        match reply {
            WorkerEvent::Finished { outcome, .. } => match outcome {
                JobOutcome::Completed => {
                    println!("{dest} is in sync with {source}");
                    Ok(())
                }
                JobOutcome::CompletedWithErrors { report } => {
                    eprintln!("{}", report.trim_end());
                    Err("sync finished with errors".into())
                }
                JobOutcome::Cancelled => Err("sync interrupted".into()),
            },
            other => Err(format!("unexpected reply {other:?}").into()),
        }
    }
}
