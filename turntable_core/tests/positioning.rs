use rstest::rstest;
use turntable_core::geometry::target_qei;
use turntable_core::{
    Command, Drive, InitStep, Inventory, MotorCommand, Reply, Scheduler, SlotIndex, Station,
    TimingCfg, Turntable, TurntableBuilder, TurntableError,
};

const LIMIT_MS: u64 = 60_000;

fn engine() -> Turntable {
    TurntableBuilder::new()
        .with_inventory(Inventory::empty())
        .build()
        .unwrap()
}

fn initialized() -> Scheduler {
    let mut s = Scheduler::new(engine());
    s.apply(Command::StartInitialization);
    s.run_until(|t| t.is_initialized(), LIMIT_MS).unwrap();
    s
}

#[derive(Debug, Default)]
struct Jammed {
    pos: u16,
    cmd: MotorCommand,
}

impl Drive for Jammed {
    fn command(&self) -> MotorCommand {
        self.cmd
    }
    fn set_command(&mut self, cmd: MotorCommand) {
        self.cmd = cmd;
    }
    fn position(&self) -> u16 {
        self.pos
    }
    fn snap_to(&mut self, qei: u16) {
        self.pos = qei;
    }
    fn tick(&mut self) {}
}

#[rstest]
#[case(0, Station::Refill, 0)]
#[case(0, Station::Dispense1P, 1024)]
#[case(0, Station::Dispense2P, 3072)]
#[case(0, Station::Reject, 2048)]
#[case(2, Station::Refill, 3277)]
#[case(5, Station::Dispense1P, 3072)]
fn move_computes_target(#[case] slot: usize, #[case] station: Station, #[case] want: u16) {
    let mut t = engine();
    let got = t.move_to_position(slot, station).unwrap();
    assert_eq!(got, want);
    assert_eq!(t.target_qei(), Some(want));
    assert_eq!(t.current_slot().get(), slot);
    assert_eq!(t.motor(), MotorCommand::Forward);
}

#[test]
fn move_rejects_out_of_range_slot() {
    let mut t = engine();
    assert_eq!(
        t.move_to_position(10, Station::Refill),
        Err(TurntableError::SlotOutOfRange(10))
    );
    assert_eq!(t.target_qei(), None);
    assert_eq!(t.motor(), MotorCommand::Stop);
}

#[test]
fn arrival_snaps_to_target_and_clears_it() {
    let mut s = initialized();
    let slot = SlotIndex::new(3).unwrap();
    let reply = s.apply(Command::MoveTo {
        slot,
        station: Station::Dispense1P,
    });
    let want = target_qei(slot, Station::Dispense1P, 4096);
    assert_eq!(reply, Reply::MoveStarted { target_qei: want });

    s.run_until(|t| t.target_qei().is_none(), LIMIT_MS).unwrap();
    assert_eq!(s.engine().position(), want);
    assert_eq!(s.engine().motor(), MotorCommand::Stop);
    assert_eq!(s.engine().current_slot(), slot);
    assert_eq!(s.engine().last_fault(), None);
    let newest = s.engine().log().newest().unwrap();
    assert!(newest.message.contains("arrived"), "{}", newest.message);
}

#[test]
fn moves_always_run_forward_across_the_seam() {
    let mut s = initialized();
    s.engine_mut()
        .move_to_position(0, Station::Dispense1P)
        .unwrap();
    s.run_until(|t| t.target_qei().is_none(), LIMIT_MS).unwrap();
    assert_eq!(s.engine().position(), 1024);

    // Slot 0 back to REFILL is 1024 counts "behind"; the controller goes the long way.
    s.engine_mut().move_to_position(0, Station::Refill).unwrap();
    let mut prev = s.engine().position();
    let mut ticks = 0u32;
    while s.engine().target_qei().is_some() {
        s.advance(10);
        let pos = s.engine().position();
        let delta = (u32::from(pos) + 4096 - u32::from(prev)) % 4096;
        // One step per tick, plus at most one step of snap on arrival.
        assert!(delta <= 40, "moved backwards: {prev} -> {pos}");
        prev = pos;
        ticks += 1;
        assert!(ticks < 1_000);
    }
    assert_eq!(s.engine().position(), 0);
    assert!(ticks > 150, "took the short way in {ticks} ticks");
}

#[test]
fn move_preempts_running_initialization() {
    let mut s = Scheduler::new(engine());
    s.apply(Command::StartInitialization);
    s.run_until(|t| t.scan_count() >= 2, LIMIT_MS).unwrap();
    assert_eq!(s.engine().init_step(), InitStep::ScanInventory);

    s.engine_mut().move_to_position(4, Station::Reject).unwrap();
    assert_eq!(s.engine().init_step(), InitStep::Idle);
    assert_eq!(s.engine().motor(), MotorCommand::Forward);

    s.run_until(|t| t.target_qei().is_none(), LIMIT_MS).unwrap();
    let want = target_qei(SlotIndex::new(4).unwrap(), Station::Reject, 4096);
    assert_eq!(s.engine().position(), want);
    assert_eq!(s.engine().init_step(), InitStep::Idle);
    assert!(!s.engine().is_initialized());
}

#[test]
fn starting_initialization_clears_a_pending_move() {
    let mut s = initialized();
    s.engine_mut().move_to_position(7, Station::Reject).unwrap();
    s.advance(50);
    s.apply(Command::StartInitialization);
    assert_eq!(s.engine().target_qei(), None);
    assert_eq!(s.engine().init_step(), InitStep::FindHome);
}

#[test]
fn stalled_move_times_out() {
    let timing = TimingCfg {
        home_timeout_ms: 0,
        move_timeout_ms: 300,
        ..TimingCfg::default()
    };
    let engine = TurntableBuilder::new()
        .with_seed(1)
        .with_timing(timing)
        .with_drive(Jammed::default())
        .try_build()
        .unwrap();
    let mut s = Scheduler::new(engine);
    s.apply(Command::StartInitialization);
    s.engine_mut()
        .move_to_position(0, Station::Dispense1P)
        .unwrap();

    let spent = s
        .run_until(|t| t.last_fault().is_some(), 5_000)
        .unwrap();
    assert_eq!(spent, 300);
    assert_eq!(
        s.engine().last_fault(),
        Some(&TurntableError::MoveTimeout {
            target: 1024,
            after_ms: 300
        })
    );
    assert_eq!(s.engine().target_qei(), None);
    assert_eq!(s.engine().motor(), MotorCommand::Stop);
}
