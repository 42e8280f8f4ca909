//! A terminal spinner that follows a slice while it waits on the API.

use std::io::Write;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Blade-swing frames.
const FRAMES: &[&str] = &["-", "\\", "|", "/"];

const INTERVAL: Duration = Duration::from_millis(100);

/// Runs on stderr in a background task so stdout stays clean for the
/// progress log. The label can be swapped while it spins.
pub struct Spinner {
    handle: JoinHandle<()>,
    label: watch::Sender<String>,
    cancel: watch::Sender<bool>,
}

impl Spinner {
    pub fn start(label: &str) -> Self {
        let (label_tx, label_rx) = watch::channel(label.to_string());
        let (cancel_tx, mut cancel_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut i = 0;
            loop {
                let frame = FRAMES[i % FRAMES.len()];
                let label = label_rx.borrow().clone();
                // \x1b[2K clears the line, \r returns to column 0
                eprint!("\x1b[2K\r  {frame} {label}");
                let _ = std::io::stderr().flush();

                tokio::select! {
                    _ = tokio::time::sleep(INTERVAL) => {}
                    _ = cancel_rx.changed() => break,
                }
                i += 1;
            }
            eprint!("\x1b[2K\r");
            let _ = std::io::stderr().flush();
        });

        Self {
            handle,
            label: label_tx,
            cancel: cancel_tx,
        }
    }

    /// Change the text next to the spinner.
    pub fn set_label(&self, label: &str) {
        self.label.send_replace(label.to_string());
    }

    #[cfg(test)]
    pub(crate) fn label(&self) -> String {
        self.label.borrow().clone()
    }

    /// Stop the spinner and clear its line.
    pub async fn stop(self) {
        let _ = self.cancel.send(true);
        let _ = self.handle.await;
    }
}
