use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct DelayState {
    fired: bool,
    waker: Option<Waker>,
}

#[derive(Debug)]
struct TimerEntry {
    deadline: Instant,
    state: Rc<RefCell<DelayState>>,
}

/// Deadline queue fired by the host once per frame.
///
/// Timers only resolve when `fire_due` is called, so they never wake a task
/// between frames and never need a background thread.
#[derive(Debug, Clone, Default)]
pub struct FrameTimers {
    entries: Rc<RefCell<Vec<TimerEntry>>>,
}

impl FrameTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// A future that resolves on the first `fire_due` at or after `now + duration`.
    pub fn delay(&self, duration: Duration) -> Delay {
        self.delay_until(Instant::now() + duration)
    }

    pub fn delay_until(&self, deadline: Instant) -> Delay {
        let state = Rc::new(RefCell::new(DelayState::default()));
        self.entries.borrow_mut().push(TimerEntry {
            deadline,
            state: state.clone(),
        });
        Delay { state }
    }

    /// Resolve every timer whose deadline has passed. Returns how many fired.
    pub fn fire_due(&self, now: Instant) -> usize {
        let due: Vec<TimerEntry> = {
            let mut entries = self.entries.borrow_mut();
            let (due, pending): (Vec<_>, Vec<_>) =
                entries.drain(..).partition(|e| e.deadline <= now);
            *entries = pending;
            due
        };
        for entry in &due {
            let mut state = entry.state.borrow_mut();
            state.fired = true;
            if let Some(waker) = state.waker.take() {
                waker.wake();
            }
        }
        if !due.is_empty() {
            tracing::trace!(fired = due.len(), "frame timers fired");
        }
        due.len()
    }

    /// Number of timers still waiting.
    pub fn pending(&self) -> usize {
        self.entries.borrow().len()
    }
}

/// Future returned by `FrameTimers::delay`.
#[derive(Debug)]
pub struct Delay {
    state: Rc<RefCell<DelayState>>,
}

impl Future for Delay {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let mut state = self.state.borrow_mut();
        if state.fired {
            Poll::Ready(())
        } else {
            state.waker = Some(cx.waker().clone());
            Poll::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::LocalPool;
    use futures::task::LocalSpawnExt;

    #[test]
    fn delay_waits_for_fire() {
        let timers = FrameTimers::new();
        let done = Rc::new(RefCell::new(false));
        let flag = done.clone();
        let delay = timers.delay(Duration::from_millis(50));

        let mut pool = LocalPool::new();
        pool.spawner()
            .spawn_local(async move {
                delay.await;
                *flag.borrow_mut() = true;
            })
            .unwrap();

        pool.run_until_stalled();
        assert!(!*done.borrow());
        assert_eq!(timers.pending(), 1);

        let fired = timers.fire_due(Instant::now() + Duration::from_secs(1));
        assert_eq!(fired, 1);
        pool.run_until_stalled();
        assert!(*done.borrow());
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn fire_due_leaves_future_deadlines() {
        let timers = FrameTimers::new();
        let now = Instant::now();
        let _soon = timers.delay_until(now);
        let _later = timers.delay_until(now + Duration::from_secs(60));
        assert_eq!(timers.fire_due(now), 1);
        assert_eq!(timers.pending(), 1);
    }
}
