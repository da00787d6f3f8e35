//! Single-shot completion handle given to transform plugins

use super::output::RawOutput;
use super::plugin::PluginError;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::debug;

pub(crate) type Signal = Result<RawOutput, PluginError>;

/// Completion handle for one transform invocation
///
/// Cloneable, so a plugin can move it into a spawned task. The first signal
/// wins; later signals from any clone are ignored.
#[derive(Clone)]
pub struct Completion {
    inner: Arc<Inner>,
}

struct Inner {
    path: PathBuf,
    tx: Mutex<Option<oneshot::Sender<Signal>>>,
}

impl Completion {
    pub(crate) fn channel(path: &Path) -> (Self, oneshot::Receiver<Signal>) {
        let (tx, rx) = oneshot::channel();
        let completion = Self {
            inner: Arc::new(Inner {
                path: path.to_path_buf(),
                tx: Mutex::new(Some(tx)),
            }),
        };
        (completion, rx)
    }

    /// Signal the result; returns false if a result was already signalled
    pub fn complete(&self, result: Result<RawOutput, PluginError>) -> bool {
        let Some(tx) = self.inner.tx.lock().take() else {
            debug!(
                "Ignoring repeated completion of transform for {}",
                self.inner.path.display()
            );
            return false;
        };
        // receiver gone means the dispatcher stopped waiting
        let _ = tx.send(result);
        true
    }

    /// Signal a successful result
    pub fn ok(&self, output: impl Into<RawOutput>) -> bool {
        self.complete(Ok(output.into()))
    }

    /// Signal a failure
    pub fn fail(&self, error: impl Into<PluginError>) -> bool {
        self.complete(Err(error.into()))
    }

    pub fn is_done(&self) -> bool {
        self.inner.tx.lock().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_signal_wins() {
        let (done, rx) = Completion::channel(Path::new("/p/a.ts"));
        let other = done.clone();

        assert!(done.ok("first"));
        assert!(!other.ok("second"));
        assert!(!other.fail("late failure"));
        assert!(done.is_done());

        let got = rx.await.unwrap().unwrap();
        assert_eq!(got, RawOutput::from("first"));
    }

    #[tokio::test]
    async fn dropping_all_handles_closes_channel() {
        let (done, rx) = Completion::channel(Path::new("/p/a.ts"));
        drop(done);
        assert!(rx.await.is_err());
    }
}
