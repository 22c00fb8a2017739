use super::Platform;
use std::cell::Cell;

/// Trailing-edge debounce over a single platform timer.
///
/// Arming always clears the previously armed timer first, so at most one
/// callback is outstanding at any time.
#[derive(Debug)]
pub(crate) struct Debouncer {
    delay_ms: i32,
    pending: Cell<Option<i32>>,
}

impl Debouncer {
    pub fn new(delay_ms: i32) -> Self {
        Self {
            delay_ms,
            pending: Cell::new(None),
        }
    }

    pub fn delay_ms(&self) -> i32 {
        self.delay_ms
    }

    pub fn arm<P: Platform>(&self, platform: &P, callback: Box<dyn FnOnce()>) {
        self.cancel(platform);
        self.pending.set(platform.set_timeout(self.delay_ms, callback));
    }

    pub fn cancel<P: Platform>(&self, platform: &P) {
        if let Some(handle) = self.pending.take() {
            platform.clear_timeout(handle);
        }
    }

    /// Called from the timer callback once it runs.
    pub fn fired(&self) {
        self.pending.set(None);
    }

    #[cfg(test)]
    pub fn is_armed(&self) -> bool {
        self.pending.get().is_some()
    }
}
