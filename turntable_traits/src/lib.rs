//! Seams between the turntable engine and whatever turns the platter.
//!
//! The engine only ever talks to a [`Drive`]: it commands a direction and
//! reads back the absolute encoder count. The simulated encoder model in
//! `turntable_core` is one implementation; tests plug in others.
pub mod clock;

pub use clock::{Clock, MonotonicClock};

use std::fmt;

/// Direction the turntable motor is commanded to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MotorCommand {
    #[default]
    Stop,
    Forward,
    Backward,
}

impl MotorCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            MotorCommand::Stop => "STOP",
            MotorCommand::Forward => "FORWARD",
            MotorCommand::Backward => "BACKWARD",
        }
    }
}

impl fmt::Display for MotorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Motor plus quadrature encoder, as seen by the controllers.
///
/// Positions are absolute encoder counts in `[0, round)`.
pub trait Drive {
    fn command(&self) -> MotorCommand;
    fn set_command(&mut self, cmd: MotorCommand);
    fn position(&self) -> u16;
    /// Overwrite the encoder count (software zeroing / re-alignment).
    fn snap_to(&mut self, qei: u16);
    /// Integrate one physics period of the current command.
    fn tick(&mut self);
}

impl<D: Drive + ?Sized> Drive for Box<D> {
    fn command(&self) -> MotorCommand {
        (**self).command()
    }
    fn set_command(&mut self, cmd: MotorCommand) {
        (**self).set_command(cmd);
    }
    fn position(&self) -> u16 {
        (**self).position()
    }
    fn snap_to(&mut self, qei: u16) {
        (**self).snap_to(qei);
    }
    fn tick(&mut self) {
        (**self).tick();
    }
}
