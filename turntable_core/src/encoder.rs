//! Simulated motor and quadrature encoder.
//!
//! Pure integration: every physics tick moves the count by `step` in the
//! commanded direction, wrapping modulo `round`. No inertia, no slip.

use turntable_traits::{Drive, MotorCommand};

#[derive(Debug, Clone)]
pub struct EncoderModel {
    round: u16,
    step: u16,
    position: u16,
    command: MotorCommand,
}

impl EncoderModel {
    pub fn new(round: u16, step: u16) -> Self {
        debug_assert!(round > 0 && step < round);
        Self {
            round,
            step,
            position: 0,
            command: MotorCommand::Stop,
        }
    }

    pub fn round(&self) -> u16 {
        self.round
    }

    pub fn step(&self) -> u16 {
        self.step
    }
}

impl Drive for EncoderModel {
    fn command(&self) -> MotorCommand {
        self.command
    }

    fn set_command(&mut self, cmd: MotorCommand) {
        self.command = cmd;
    }

    fn position(&self) -> u16 {
        self.position
    }

    fn snap_to(&mut self, qei: u16) {
        self.position = qei % self.round;
    }

    fn tick(&mut self) {
        let round = u32::from(self.round);
        let pos = u32::from(self.position);
        let step = u32::from(self.step);
        self.position = match self.command {
            MotorCommand::Stop => return,
            MotorCommand::Forward => ((pos + step) % round) as u16,
            MotorCommand::Backward => ((pos + round - step) % round) as u16,
        };
        tracing::trace!(qei = self.position, cmd = %self.command, "physics tick");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn one_tick_integrates_command(p in 0u16..4096) {
            let mut m = EncoderModel::new(4096, 20);
            m.snap_to(p);
            m.set_command(MotorCommand::Forward);
            m.tick();
            prop_assert_eq!(m.position(), (p + 20) % 4096);

            m.snap_to(p);
            m.set_command(MotorCommand::Backward);
            m.tick();
            prop_assert_eq!(m.position(), ((u32::from(p) + 4096 - 20) % 4096) as u16);

            m.snap_to(p);
            m.set_command(MotorCommand::Stop);
            m.tick();
            prop_assert_eq!(m.position(), p);
        }
    }

    #[test]
    fn forward_wraps_past_round() {
        let mut m = EncoderModel::new(4096, 20);
        m.snap_to(4090);
        m.set_command(MotorCommand::Forward);
        m.tick();
        assert_eq!(m.position(), 14);
    }

    #[test]
    fn snap_is_reduced_modulo_round() {
        let mut m = EncoderModel::new(4096, 20);
        m.snap_to(4096);
        assert_eq!(m.position(), 0);
    }
}
