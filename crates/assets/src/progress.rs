use std::cell::RefCell;
use std::rc::Rc;

/// Bytes transferred so far, with the size the caller expects in total.
///
/// The expected total only feeds the display percentage; loading never
/// depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadProgress {
    pub loaded: u64,
    pub expected_total: Option<u64>,
}

impl LoadProgress {
    /// Display percentage in `0..=100`, if a non-zero total is known.
    pub fn percent(&self) -> Option<f32> {
        self.expected_total
            .filter(|total| *total > 0)
            .map(|total| ((self.loaded as f64 / total as f64) * 100.0).min(100.0) as f32)
    }
}

type Listener = Rc<dyn Fn(LoadProgress)>;

/// Shared, monotonic progress counter handed to asset sources.
///
/// Cloning shares the counter. Reports lower than the current value are
/// dropped, so a retried transfer that restarts from zero does not move the
/// counter backwards. Listeners run synchronously and must not block.
#[derive(Clone, Default)]
pub struct ProgressTracker {
    state: Rc<RefCell<LoadProgress>>,
    listener: Option<Listener>,
}

impl ProgressTracker {
    pub fn new(expected_total: Option<u64>) -> Self {
        Self {
            state: Rc::new(RefCell::new(LoadProgress {
                loaded: 0,
                expected_total,
            })),
            listener: None,
        }
    }

    pub fn with_listener(mut self, listener: impl Fn(LoadProgress) + 'static) -> Self {
        self.listener = Some(Rc::new(listener));
        self
    }

    /// Record that `loaded` bytes have arrived.
    pub fn report(&self, loaded: u64) {
        let snapshot = {
            let mut state = self.state.borrow_mut();
            if loaded < state.loaded {
                tracing::trace!(loaded, current = state.loaded, "ignoring stale progress");
                return;
            }
            state.loaded = loaded;
            *state
        };
        tracing::trace!(loaded, percent = ?snapshot.percent(), "asset progress");
        if let Some(listener) = &self.listener {
            listener(snapshot);
        }
    }

    pub fn latest(&self) -> LoadProgress {
        *self.state.borrow()
    }
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("latest", &self.latest())
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_uses_expected_total() {
        let p = LoadProgress {
            loaded: 104_973,
            expected_total: Some(209_946),
        };
        assert_eq!(p.percent(), Some(50.0));
        let unknown = LoadProgress {
            loaded: 10,
            expected_total: None,
        };
        assert_eq!(unknown.percent(), None);
    }

    #[test]
    fn percent_is_capped_for_display() {
        let p = LoadProgress {
            loaded: 300,
            expected_total: Some(200),
        };
        assert_eq!(p.percent(), Some(100.0));
    }

    #[test]
    fn reports_never_decrease() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let tracker =
            ProgressTracker::new(Some(100)).with_listener(move |p| sink.borrow_mut().push(p.loaded));

        tracker.report(10);
        tracker.report(40);
        tracker.report(5);
        tracker.report(40);
        tracker.report(100);

        assert_eq!(*seen.borrow(), vec![10, 40, 40, 100]);
        assert_eq!(tracker.latest().loaded, 100);
    }

    #[test]
    fn clones_share_the_counter() {
        let a = ProgressTracker::new(None);
        let b = a.clone();
        b.report(7);
        assert_eq!(a.latest().loaded, 7);
    }
}
