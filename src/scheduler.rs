//! Frame scheduling: the tick state machine, the effect clock, and the
//! cancellation flag hosts use to stop the loop.
//!
//! The scheduler never sleeps or spins. Each tick ends by asking the host's
//! [`FramePacer`] for another vsync-aligned callback (winit
//! `request_redraw`, browser `requestAnimationFrame`); once stopped it stops
//! asking, and the loop winds down on its own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::OrbitError;
use crate::options::{EffectOptions, TimeLaw};

/// Host hook that schedules the next tick.
pub trait FramePacer {
    /// Ask the host to call [`Pipeline::tick`](crate::Pipeline::tick) again
    /// at the next display refresh.
    fn request_frame(&mut self);
}

/// Lifecycle of a [`FrameScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Constructed, not yet started.
    Idle,
    /// Ticking; each tick requests the next.
    Running,
    /// Stopped through a [`StopHandle`]; no further frames are requested.
    Stopped,
}

/// Shared cancellation flag. Cloneable and sendable so any owner (window
/// close handler, page unload listener, another thread) can stop the loop.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Request the loop to stop at the top of the next tick.
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether [`stop`](Self::stop) has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Scalar effect time advanced by a fixed step per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectClock {
    time: f64,
    step: f64,
}

impl EffectClock {
    /// Clock at zero advancing by `step` per tick.
    #[must_use]
    pub fn new(step: f64) -> Self {
        Self { time: 0.0, step }
    }

    /// Advance by one step and return the new time.
    pub fn advance(&mut self) -> f64 {
        self.time += self.step;
        self.time
    }

    /// Current time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Per-tick increment.
    #[must_use]
    pub fn step(&self) -> f64 {
        self.step
    }
}

/// What a call to [`Pipeline::tick`](crate::Pipeline::tick) did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A frame was rendered and presented through this many passes.
    Rendered(usize),
    /// The frame could not be acquired; time still advanced and the next
    /// frame was requested.
    Dropped,
    /// The scheduler is not running; nothing happened.
    Halted,
}

/// Tick state machine owning the effect clock and the host's pacer.
pub struct FrameScheduler {
    state: SchedulerState,
    clock: EffectClock,
    law: TimeLaw,
    stop: StopHandle,
    pacer: Box<dyn FramePacer>,
    ticks: u64,
}

impl FrameScheduler {
    /// Idle scheduler configured from the effect options.
    #[must_use]
    pub fn new(pacer: Box<dyn FramePacer>, options: &EffectOptions) -> Self {
        Self {
            state: SchedulerState::Idle,
            clock: EffectClock::new(options.time_step),
            law: options.time_law,
            stop: StopHandle::default(),
            pacer,
            ticks: 0,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// A handle that stops this scheduler.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// The effect clock.
    #[must_use]
    pub fn clock(&self) -> &EffectClock {
        &self.clock
    }

    /// Ticks that advanced the clock.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Move Idle -> Running and request the first frame.
    ///
    /// # Errors
    ///
    /// [`OrbitError::AlreadyStarted`] unless the scheduler is Idle.
    pub fn start(&mut self) -> Result<(), OrbitError> {
        if self.state != SchedulerState::Idle {
            return Err(OrbitError::AlreadyStarted);
        }
        if self.stop.is_stopped() {
            self.state = SchedulerState::Stopped;
            log::debug!("scheduler: stopped before start");
            return Ok(());
        }
        self.state = SchedulerState::Running;
        log::debug!("scheduler: started");
        self.pacer.request_frame();
        Ok(())
    }

    /// Top of a tick: honour the stop flag, then advance the clock.
    ///
    /// Returns the amount to add to the effect pass's time, or `None` if
    /// the scheduler is not running and the tick must do nothing.
    pub fn begin_tick(&mut self) -> Option<f64> {
        if self.stop.is_stopped() && self.state != SchedulerState::Stopped {
            log::info!("scheduler: stopped after {} ticks", self.ticks);
            self.state = SchedulerState::Stopped;
        }
        if self.state != SchedulerState::Running {
            return None;
        }
        let time = self.clock.advance();
        self.ticks += 1;
        Some(match self.law {
            TimeLaw::Compounding => time,
            TimeLaw::Linear => self.clock.step(),
        })
    }

    /// Bottom of a tick: request the next frame unless stopped meanwhile.
    pub fn finish_tick(&mut self) {
        if self.state == SchedulerState::Running && !self.stop.is_stopped() {
            self.pacer.request_frame();
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    /// Pacer counting how many frames were requested.
    #[derive(Default, Clone)]
    pub(crate) struct CountingPacer(pub Rc<Cell<u32>>);

    impl FramePacer for CountingPacer {
        fn request_frame(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn scheduler(law: TimeLaw) -> (FrameScheduler, Rc<Cell<u32>>) {
        let pacer = CountingPacer::default();
        let requests = Rc::clone(&pacer.0);
        let options = EffectOptions {
            time_law: law,
            ..EffectOptions::default()
        };
        (FrameScheduler::new(Box::new(pacer), &options), requests)
    }

    #[test]
    fn start_is_legal_once() {
        let (mut sched, requests) = scheduler(TimeLaw::Compounding);
        assert_eq!(sched.state(), SchedulerState::Idle);
        sched.start().unwrap();
        assert_eq!(sched.state(), SchedulerState::Running);
        assert_eq!(requests.get(), 1);
        assert!(matches!(sched.start(), Err(OrbitError::AlreadyStarted)));
        assert_eq!(requests.get(), 1);
    }

    #[test]
    fn idle_scheduler_does_not_tick() {
        let (mut sched, _) = scheduler(TimeLaw::Compounding);
        assert_eq!(sched.begin_tick(), None);
        assert_eq!(sched.clock().time(), 0.0);
    }

    #[test]
    fn clock_is_monotonic() {
        let (mut sched, requests) = scheduler(TimeLaw::Compounding);
        sched.start().unwrap();
        let mut last = sched.clock().time();
        for _ in 0..50 {
            let _ = sched.begin_tick().unwrap();
            sched.finish_tick();
            assert!(sched.clock().time() > last);
            last = sched.clock().time();
        }
        assert_eq!(sched.ticks(), 50);
        assert_eq!(requests.get(), 51);
    }

    #[test]
    fn compounding_law_yields_clock_time() {
        let (mut sched, _) = scheduler(TimeLaw::Compounding);
        sched.start().unwrap();
        let deltas: Vec<f64> = (0..3).filter_map(|_| sched.begin_tick()).collect();
        let expected = [0.05, 0.1, 0.15];
        for (d, e) in deltas.iter().zip(expected) {
            assert!((d - e).abs() < 1e-9);
        }
    }

    #[test]
    fn linear_law_yields_step() {
        let (mut sched, _) = scheduler(TimeLaw::Linear);
        sched.start().unwrap();
        for _ in 0..3 {
            let delta = sched.begin_tick().unwrap();
            assert!((delta - 0.05).abs() < 1e-9);
        }
    }

    #[test]
    fn stop_halts_ticks_and_requests() {
        let (mut sched, requests) = scheduler(TimeLaw::Compounding);
        sched.start().unwrap();
        let handle = sched.stop_handle();
        let _ = sched.begin_tick();
        handle.stop();
        sched.finish_tick();
        assert_eq!(requests.get(), 1);

        assert_eq!(sched.begin_tick(), None);
        assert_eq!(sched.state(), SchedulerState::Stopped);
        sched.finish_tick();
        assert_eq!(requests.get(), 1);
        assert_eq!(sched.ticks(), 1);
    }

    #[test]
    fn stop_before_start_never_requests() {
        let (mut sched, requests) = scheduler(TimeLaw::Compounding);
        sched.stop_handle().stop();
        sched.start().unwrap();
        assert_eq!(sched.state(), SchedulerState::Stopped);
        assert_eq!(requests.get(), 0);
    }

    #[test]
    fn stop_handle_crosses_threads() {
        let handle = StopHandle::default();
        let remote = handle.clone();
        std::thread::spawn(move || remote.stop()).join().unwrap();
        assert!(handle.is_stopped());
    }
}
