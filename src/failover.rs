//! Host failover cursor.
//!
//! One cursor is shared by every dispatch on a client. Rotation state lives
//! behind a mutex so concurrent advances and resets serialize instead of
//! racing on a read-modify-write.

use parking_lot::Mutex;

/// Outcome of one cursor rotation.
#[derive(Debug)]
pub(crate) struct Rotation {
    /// Host now active after the rotation.
    pub host: String,
    /// The failure count has reached one full rotation; the caller must
    /// stop retrying and surface the last error.
    pub exhausted: bool,
}

#[derive(Debug)]
struct CursorState {
    active: usize,
    consecutive_failures: usize,
}

/// Tracks which host in the configured list is active and how many
/// consecutive connection failures have occurred.
///
/// With a single configured host the cursor never rotates; failover is
/// effectively disabled.
#[derive(Debug)]
pub(crate) struct FailoverCursor {
    hosts: Vec<String>,
    state: Mutex<CursorState>,
}

impl FailoverCursor {
    /// `hosts` must be non-empty; settings validation guarantees this.
    pub fn new(hosts: Vec<String>) -> Self {
        debug_assert!(!hosts.is_empty());
        FailoverCursor {
            hosts,
            state: Mutex::new(CursorState {
                active: 0,
                consecutive_failures: 0,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// The currently-active host.
    pub fn current(&self) -> String {
        self.hosts[self.state.lock().active].clone()
    }

    /// Record a connection failure and step to the next host, wrapping at
    /// the end of the list. Reports exhaustion once the failure count
    /// reaches the list length, so a call makes at most one full rotation.
    pub fn advance(&self) -> Rotation {
        let mut state = self.state.lock();
        state.consecutive_failures += 1;
        state.active = (state.active + 1) % self.hosts.len();
        Rotation {
            host: self.hosts[state.active].clone(),
            exhausted: state.consecutive_failures >= self.hosts.len(),
        }
    }

    /// Clear the failure count after any successful exchange, whichever
    /// host served it. The active host is left where it is.
    pub fn reset(&self) {
        self.state.lock().consecutive_failures = 0;
    }

    #[cfg(test)]
    fn consecutive_failures(&self) -> usize {
        self.state.lock().consecutive_failures
    }
}
