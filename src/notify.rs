// Change notification for word sources.
//
// Subscribers share a broadcast channel of opaque `Changed` events; the layout
// is re-run between passes when one arrives, never mid-pass. The channel is
// used from plain threads, no async runtime is involved.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant, SystemTime};

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

/// Events a subscription may fall behind by before older ones are dropped.
/// A lagging subscriber still sees that something changed.
const CHANNEL_CAPACITY: usize = 16;

const POLL_STEP: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    Changed,
}

/// Fans `Changed` events out to every live subscription.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }
}

/// Receiving end of [`ChangeNotifier::subscribe`]. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<ChangeEvent>,
}

impl Subscription {
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::trace!(skipped, "subscription lagged");
                Some(ChangeEvent::Changed)
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => None,
        }
    }

    /// Blocks for the next event; `None` once the notifier is gone.
    ///
    /// Must not be called from inside an async runtime.
    pub fn recv(&mut self) -> Option<ChangeEvent> {
        match self.receiver.blocking_recv() {
            Ok(event) => Some(event),
            Err(RecvError::Lagged(_)) => Some(ChangeEvent::Changed),
            Err(RecvError::Closed) => None,
        }
    }

    /// Waits up to `timeout`; `None` on timeout or when the notifier is gone.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<ChangeEvent> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(_)) => return Some(ChangeEvent::Changed),
                Err(TryRecvError::Closed) => return None,
                Err(TryRecvError::Empty) => {}
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            std::thread::sleep(POLL_STEP.min(deadline - now));
        }
    }

    /// Drains queued events, reporting whether there was at least one.
    pub fn drain(&mut self) -> bool {
        let mut any = false;
        loop {
            match self.receiver.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => any = true,
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        any
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn unsubscribe(&self, subscription: Subscription) {
        drop(subscription);
    }

    /// Sends `Changed` to every subscriber and returns how many received it.
    pub fn notify(&self) -> usize {
        let delivered = self.sender.send(ChangeEvent::Changed).unwrap_or(0);
        tracing::trace!(delivered, "change notified");
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

fn stamp(path: &Path) -> Option<FileStamp> {
    let meta = std::fs::metadata(path).ok()?;
    Some(FileStamp {
        modified: meta.modified().ok(),
        len: meta.len(),
    })
}

/// Background thread that notifies when a file's modification time or length
/// changes. A file appearing or disappearing also counts as a change.
#[derive(Debug)]
pub struct FilePoller {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl FilePoller {
    pub fn spawn(
        path: impl Into<PathBuf>,
        interval: Duration,
        notifier: ChangeNotifier,
    ) -> std::io::Result<Self> {
        let path = path.into();
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let handle = std::thread::Builder::new()
            .name("wcloud-file-poller".to_string())
            .spawn(move || {
                let mut last = stamp(&path);
                tracing::debug!(path = %path.display(), "watching for changes");
                while !thread_stop.load(Ordering::SeqCst) {
                    std::thread::sleep(interval);
                    let current = stamp(&path);
                    if current != last {
                        tracing::debug!(path = %path.display(), "file changed");
                        last = current;
                        notifier.notify();
                    }
                }
            })?;
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            join_poller(handle);
        }
    }
}

/// Returns `false` when the poller thread panicked.
fn join_poller(handle: JoinHandle<()>) -> bool {
    match handle.join() {
        Ok(()) => true,
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::warn!(%reason, "file poller thread panicked");
            false
        }
    }
}

impl Drop for FilePoller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_reaches_every_subscriber() {
        let notifier = ChangeNotifier::new();
        let mut a = notifier.subscribe();
        let mut b = notifier.subscribe();
        assert_eq!(notifier.subscriber_count(), 2);
        assert_eq!(notifier.notify(), 2);
        assert_eq!(a.try_recv(), Some(ChangeEvent::Changed));
        assert_eq!(b.try_recv(), Some(ChangeEvent::Changed));
        assert_eq!(a.try_recv(), None);
    }

    #[test]
    fn unsubscribed_receivers_are_not_counted() {
        let notifier = ChangeNotifier::new();
        let a = notifier.subscribe();
        assert_eq!(notifier.subscriber_count(), 1);
        notifier.unsubscribe(a);
        assert_eq!(notifier.subscriber_count(), 0);
        assert_eq!(notifier.notify(), 0);
    }

    #[test]
    fn dropped_subscriptions_stop_counting() {
        let notifier = ChangeNotifier::new();
        let mut kept = notifier.subscribe();
        drop(notifier.subscribe());
        assert_eq!(notifier.notify(), 1);
        assert_eq!(notifier.subscriber_count(), 1);
        assert!(kept.drain());
        assert!(!kept.drain());
    }

    #[test]
    fn lagging_subscriber_still_sees_a_change() {
        let notifier = ChangeNotifier::new();
        let mut sub = notifier.subscribe();
        for _ in 0..CHANNEL_CAPACITY * 2 {
            notifier.notify();
        }
        assert_eq!(sub.try_recv(), Some(ChangeEvent::Changed));
        assert!(sub.drain());
        assert!(!sub.drain());
    }

    #[test]
    fn recv_ends_when_the_notifier_is_gone() {
        let notifier = ChangeNotifier::new();
        let mut sub = notifier.subscribe();
        notifier.notify();
        drop(notifier);
        assert_eq!(sub.recv(), Some(ChangeEvent::Changed));
        assert_eq!(sub.recv(), None);
        assert_eq!(sub.recv_timeout(Duration::from_millis(10)), None);
    }

    #[test]
    fn recv_timeout_gives_up_when_nothing_arrives() {
        let notifier = ChangeNotifier::new();
        let mut sub = notifier.subscribe();
        let started = Instant::now();
        assert_eq!(sub.recv_timeout(Duration::from_millis(30)), None);
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn poller_reports_file_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.txt");
        std::fs::write(&path, "rust").unwrap();

        let notifier = ChangeNotifier::new();
        let mut sub = notifier.subscribe();
        let poller = FilePoller::spawn(&path, Duration::from_millis(10), notifier).unwrap();

        std::thread::sleep(Duration::from_millis(50));
        assert!(!sub.drain());
        std::fs::write(&path, "rust\ncloud | 3").unwrap();
        assert_eq!(
            sub.recv_timeout(Duration::from_secs(5)),
            Some(ChangeEvent::Changed)
        );
        poller.stop();
    }

    #[test]
    fn panicking_poller_thread_is_reported() {
        let handle = std::thread::spawn(|| {
            panic!("stat failed");
        });
        assert!(!join_poller(handle));
        assert!(join_poller(std::thread::spawn(|| {})));
    }
}
