//! Simulated-time scheduler for the physics and logic ticks.
//!
//! Ticks fire only while the engine is active. When the engine becomes active
//! both anchors are armed one period after the current time; when it goes
//! inactive they are dropped. At equal times physics runs before logic.

use turntable_traits::Drive;

use crate::command::{Command, Reply};
use crate::engine::Turntable;
use crate::encoder::EncoderModel;
use crate::error::TurntableError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Anchors {
    physics_ms: u64,
    logic_ms: u64,
}

#[derive(Debug)]
pub struct Scheduler<D: Drive = EncoderModel> {
    engine: Turntable<D>,
    anchors: Option<Anchors>,
}

impl<D: Drive> Scheduler<D> {
    pub fn new(engine: Turntable<D>) -> Self {
        Self {
            engine,
            anchors: None,
        }
    }

    pub fn engine(&self) -> &Turntable<D> {
        &self.engine
    }

    /// Direct access for operations; anchors follow the active flag on the next advance.
    pub fn engine_mut(&mut self) -> &mut Turntable<D> {
        &mut self.engine
    }

    pub fn into_engine(self) -> Turntable<D> {
        self.engine
    }

    pub fn now_ms(&self) -> u64 {
        self.engine.now_ms()
    }

    pub fn apply(&mut self, cmd: Command) -> Reply {
        let reply = self.engine.apply(cmd);
        self.sync_anchors();
        reply
    }

    fn sync_anchors(&mut self) {
        match (self.engine.is_active(), self.anchors) {
            (true, None) => {
                let now = self.engine.now_ms();
                self.anchors = Some(Anchors {
                    physics_ms: now + self.engine.timing().physics_period_ms,
                    logic_ms: now + self.engine.timing().logic_period_ms,
                });
            }
            (false, Some(_)) => self.anchors = None,
            _ => {}
        }
    }

    /// Run every tick due in `(now, now + ms]` and leave the clock at `now + ms`.
    pub fn advance(&mut self, ms: u64) {
        let until = self.engine.now_ms().saturating_add(ms);
        loop {
            self.sync_anchors();
            let Some(a) = self.anchors else { break };
            let next = a.physics_ms.min(a.logic_ms);
            if next > until {
                break;
            }
            self.engine.sync_time(next);
            let mut a = a;
            if a.physics_ms == next {
                self.engine.physics_tick();
                a.physics_ms += self.engine.timing().physics_period_ms;
            }
            if a.logic_ms == next {
                self.engine.logic_tick();
                a.logic_ms += self.engine.timing().logic_period_ms;
            }
            self.anchors = Some(a);
        }
        self.engine.sync_time(until);
    }

    /// Advance in logic-period steps until `done` holds, for at most `limit_ms`.
    /// Returns the simulated time spent.
    pub fn run_until<F>(&mut self, mut done: F, limit_ms: u64) -> Result<u64, TurntableError>
    where
        F: FnMut(&Turntable<D>) -> bool,
    {
        let start = self.engine.now_ms();
        let step = self.engine.timing().logic_period_ms.max(1);
        loop {
            let spent = self.engine.now_ms() - start;
            if done(&self.engine) {
                return Ok(spent);
            }
            if spent >= limit_ms {
                tracing::warn!(limit_ms, step = %self.engine.init_step(), "time limit reached");
                return Err(TurntableError::TimeLimit(limit_ms));
            }
            self.advance(step.min(limit_ms - spent));
        }
    }
}
