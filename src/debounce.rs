//! Trailing-edge debouncer
//!
//! Every pushed value restarts the quiet timer; only the most recent value
//! is emitted, and only once the timer runs out without another push. A
//! burst of N pushes inside the quiet interval therefore yields exactly one
//! emission carrying the final value.
//!
//! ```text
//! push: a   b c      d            (quiet = 100ms)
//!       |---|-|------|------------|
//! emit:                c          d
//! ```
//!
//! A value still pending when all pushers are dropped is discarded.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::trace;

/// Default quiet interval
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Handle used to push values into a running debouncer task
#[derive(Debug)]
pub struct Debouncer<T> {
    input: mpsc::UnboundedSender<T>,
    task: JoinHandle<()>,
    quiet: Duration,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawn the debouncer task on the current tokio runtime
    ///
    /// Returns the push handle and the receiver of debounced values.
    pub fn spawn(quiet: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (input, input_rx) = mpsc::unbounded_channel();
        let (output_tx, output) = mpsc::unbounded_channel();

        let task = tokio::spawn(run(quiet, input_rx, output_tx));

        (Self { input, task, quiet }, output)
    }

    /// Push a new value, restarting the quiet timer
    ///
    /// Returns `false` once the debouncer task has stopped.
    pub fn push(&self, value: T) -> bool {
        self.input.send(value).is_ok()
    }

    /// Quiet interval
    pub fn quiet(&self) -> Duration {
        self.quiet
    }

    /// Check if the background task is still running
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<T>(
    quiet: Duration,
    mut input: mpsc::UnboundedReceiver<T>,
    output: mpsc::UnboundedSender<T>,
) {
    let mut pending: Option<T> = None;
    let timer = tokio::time::sleep(quiet);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            next = input.recv() => match next {
                Some(value) => {
                    pending = Some(value);
                    timer.as_mut().reset(Instant::now() + quiet);
                }
                None => break,
            },
            () = &mut timer, if pending.is_some() => {
                if let Some(value) = pending.take() {
                    trace!("Debounce interval elapsed, emitting");
                    if output.send(value).is_err() {
                        break;
                    }
                }
            }
        }
    }
}
