//! Cancellable-timer debouncing.
//!
//! A [`Debouncer`] is a tiny actor: every [`Debouncer::schedule`] cancels the
//! pending evaluation and arms a fresh timer, so only the last value of a
//! burst is ever published once the quiet period elapses.

use std::fmt::Debug;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, instrument};

#[derive(Debug)]
enum DebounceRequest<T> {
    Schedule(T),
    Flush(T),
}

#[derive(Clone)]
pub struct Debouncer<T> {
    sender: mpsc::Sender<DebounceRequest<T>>,
    settled: watch::Receiver<T>,
}

impl<T> Debouncer<T>
where
    T: Clone + Debug + Send + Sync + 'static,
{
    pub fn spawn(initial: T, quiet: Duration) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(16);
        let (settled_tx, settled) = watch::channel(initial);
        let handle = tokio::spawn(run(receiver, settled_tx, quiet));
        (Self { sender, settled }, handle)
    }

    /// Replaces any pending value and restarts the quiet period.
    pub async fn schedule(&self, value: T) -> Result<(), String> {
        self.sender
            .send(DebounceRequest::Schedule(value))
            .await
            .map_err(|e| e.to_string())
    }

    /// Publishes immediately and drops whatever was pending.
    pub async fn flush(&self, value: T) -> Result<(), String> {
        self.sender
            .send(DebounceRequest::Flush(value))
            .await
            .map_err(|e| e.to_string())
    }

    pub fn settled(&self) -> watch::Receiver<T> {
        self.settled.clone()
    }

    pub fn current(&self) -> T {
        self.settled.borrow().clone()
    }
}

#[instrument(name = "debouncer", skip_all)]
async fn run<T: Debug>(
    mut receiver: mpsc::Receiver<DebounceRequest<T>>,
    settled: watch::Sender<T>,
    quiet: Duration,
) {
    let mut pending: Option<T> = None;
    let timer = tokio::time::sleep(quiet);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            msg = receiver.recv() => match msg {
                Some(DebounceRequest::Schedule(value)) => {
                    debug!(?value, "Rescheduling evaluation");
                    pending = Some(value);
                    timer.as_mut().reset(Instant::now() + quiet);
                }
                Some(DebounceRequest::Flush(value)) => {
                    debug!(?value, "Flushing immediately");
                    pending = None;
                    settled.send_replace(value);
                }
                None => break,
            },
            () = &mut timer, if pending.is_some() => {
                if let Some(value) = pending.take() {
                    debug!(?value, "Quiet period elapsed");
                    settled.send_replace(value);
                }
            }
        }
    }
}
