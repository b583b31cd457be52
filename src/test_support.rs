use std::thread;
use std::time::{Duration, Instant};

/// Generous bound for conditions that should become true almost immediately.
pub(crate) const SETTLE: Duration = Duration::from_secs(5);

/// Poll `condition` until it holds or `timeout` passes.
///
/// Used to order thread arrivals deterministically (e.g. "wait until the
/// second thread is queued") without sleeping for a fixed time.
pub(crate) fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}

/// Like [`wait_until`] with [`SETTLE`], panicking with `what` on timeout.
pub(crate) fn settle(what: &str, condition: impl FnMut() -> bool) {
    assert!(wait_until(SETTLE, condition), "timed out waiting for {}", what);
}
