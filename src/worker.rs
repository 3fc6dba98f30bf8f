//! The one thread that owns and mutates collections.
//!
//! Callers talk to it over channels. Interruption is the exception: the
//! tokens are shared, so a running job can be stopped while the thread is
//! busy with it.

mod thread;
mod types;

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SendError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::registry::Registry;

use self::thread::spawn_worker_thread;
pub use types::{InterruptHandles, Table, WorkerCmd, WorkerEvent};

pub struct Worker {
    tx: Sender<WorkerCmd>,
    events: Receiver<WorkerEvent>,
    interrupts: InterruptHandles,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl Worker {
    /// Move `registry` onto a new worker thread.
    pub fn new(registry: Registry) -> Self {
        let (tx, rx) = mpsc::channel::<WorkerCmd>();
        let (event_tx, events) = mpsc::channel::<WorkerEvent>();
        let interrupts: InterruptHandles = Arc::new(Mutex::new(HashMap::new()));

        let handle = spawn_worker_thread(registry, rx, event_tx, interrupts.clone());

        Self {
            tx,
            events,
            interrupts,
            join: Mutex::new(Some(handle)),
        }
    }

    pub fn send(&self, cmd: WorkerCmd) -> Result<(), SendError<WorkerCmd>> {
        self.tx.send(cmd)
    }

    pub fn recv(&self) -> Option<WorkerEvent> {
        self.events.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<WorkerEvent, RecvTimeoutError> {
        self.events.recv_timeout(timeout)
    }

    pub fn interrupt_handles(&self) -> InterruptHandles {
        self.interrupts.clone()
    }

    /// Interrupt whatever job runs on `name`. False when no such collection is open.
    pub fn interrupt(&self, name: &str) -> bool {
        let Ok(map) = self.interrupts.lock() else {
            return false;
        };
        match map.get(name) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Ask the thread to flush and stop, then wait for it.
    pub fn quit(&self) {
        let _ = self.send(WorkerCmd::Quit);

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.quit();
    }
}
