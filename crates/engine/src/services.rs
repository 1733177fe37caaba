use std::time::Duration;

use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};

use crate::timer::FrameTimers;

/// Asynchronous services the engine offers to bootstrap tasks.
pub trait Services {
    /// Resolves once the input source is ready for a camera to attach to.
    fn input_ready(&self) -> LocalBoxFuture<'static, ()>;

    /// Resolves after `duration`.
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

/// Services that resolve at once. Used by headless hosts and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateServices;

impl Services for ImmediateServices {
    fn input_ready(&self) -> LocalBoxFuture<'static, ()> {
        future::ready(()).boxed_local()
    }

    fn sleep(&self, _duration: Duration) -> LocalBoxFuture<'static, ()> {
        future::ready(()).boxed_local()
    }
}

/// Services for windowed hosts; sleeps resolve on frame timers.
#[derive(Debug, Clone, Default)]
pub struct EngineServices {
    timers: FrameTimers,
}

impl EngineServices {
    pub fn new(timers: FrameTimers) -> Self {
        Self { timers }
    }

    pub fn timers(&self) -> &FrameTimers {
        &self.timers
    }
}

impl Services for EngineServices {
    fn input_ready(&self) -> LocalBoxFuture<'static, ()> {
        future::ready(()).boxed_local()
    }

    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        self.timers.delay(duration).boxed_local()
    }
}
