//! Latest-value-wins debouncing for keystroke-driven recomputation: rapid
//! submissions within the quiet window collapse to one delivery carrying only
//! the newest value. Superseded values are discarded, never queued.

use std::time::Duration;

use tokio::sync::mpsc;

/// Quiet window used by the search inputs.
pub const DEFAULT_QUIET_WINDOW: Duration = Duration::from_millis(300);

/// Handle for the submitting side. Dropping it flushes any pending value and
/// stops the worker.
#[derive(Debug)]
pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawn the coalescing worker (needs a running tokio runtime). Settled
    /// values arrive on the returned receiver.
    pub fn new(quiet: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<T>();
        let (out_tx, out_rx) = mpsc::unbounded_channel::<T>();

        tokio::spawn(async move {
            loop {
                let Some(mut latest) = rx.recv().await else {
                    return;
                };
                loop {
                    tokio::select! {
                        _ = tokio::time::sleep(quiet) => {
                            let _ = out_tx.send(latest);
                            break;
                        }
                        next = rx.recv() => match next {
                            Some(value) => latest = value,
                            None => {
                                // Input side dropped: flush the pending value.
                                let _ = out_tx.send(latest);
                                return;
                            }
                        },
                    }
                }
            }
        });

        (Debouncer { tx }, out_rx)
    }

    /// Queue a new value; any not-yet-settled previous value is superseded.
    pub fn submit(&self, value: T) {
        let _ = self.tx.send(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn burst_delivers_only_the_latest_value_once() {
        let (debouncer, mut settled) = Debouncer::new(Duration::from_millis(300));
        debouncer.submit("v".to_string());
        debouncer.submit("ve".to_string());
        debouncer.submit("venue".to_string());

        assert_eq!(settled.recv().await.as_deref(), Some("venue"));

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(settled.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn separated_submissions_each_settle() {
        let (debouncer, mut settled) = Debouncer::new(Duration::from_millis(300));
        debouncer.submit(1);
        assert_eq!(settled.recv().await, Some(1));

        debouncer.submit(2);
        assert_eq!(settled.recv().await, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn mid_window_submission_restarts_the_window() {
        let (debouncer, mut settled) = Debouncer::new(Duration::from_millis(300));
        debouncer.submit("a");
        tokio::time::sleep(Duration::from_millis(200)).await;
        debouncer.submit("ab");
        tokio::time::sleep(Duration::from_millis(200)).await;
        // 400ms elapsed but never 300ms of quiet until now.
        assert!(settled.try_recv().is_err());

        assert_eq!(settled.recv().await, Some("ab"));
    }
}
