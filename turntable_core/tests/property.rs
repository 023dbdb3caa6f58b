use proptest::prelude::*;
use turntable_core::logger::LOG_CAPACITY;
use turntable_core::{Command, InitStep, Scheduler, SlotIndex, Station, TurntableBuilder};

#[derive(Debug, Clone)]
enum Action {
    Apply(Command),
    Advance(u64),
}

fn slot_strategy() -> impl Strategy<Value = SlotIndex> {
    (0usize..10).prop_map(|i| SlotIndex::new(i).unwrap_or_default())
}

fn station_strategy() -> impl Strategy<Value = Station> {
    prop::sample::select(Station::ALL.to_vec())
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        1 => Just(Action::Apply(Command::StartInitialization)),
        1 => Just(Action::Apply(Command::Stop)),
        2 => (slot_strategy(), station_strategy())
            .prop_map(|(slot, station)| Action::Apply(Command::MoveTo { slot, station })),
        1 => slot_strategy().prop_map(|s| Action::Apply(Command::Dispense(s))),
        1 => slot_strategy().prop_map(|s| Action::Apply(Command::Refill { slot: s, qr: None })),
        1 => slot_strategy().prop_map(|s| Action::Apply(Command::Reject(s))),
        4 => (1u64..3_000).prop_map(Action::Advance),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn engine_invariants_hold_for_any_command_sequence(
        seed in any::<u64>(),
        actions in prop::collection::vec(action_strategy(), 1..40),
    ) {
        let engine = TurntableBuilder::new().with_seed(seed).build().unwrap();
        let mut s = Scheduler::new(engine);
        for action in actions {
            match action {
                Action::Apply(cmd) => { s.apply(cmd); }
                Action::Advance(ms) => s.advance(ms),
            }
            let t = s.engine();
            prop_assert!(t.position() < t.motion().round);
            prop_assert!(t.log().len() <= LOG_CAPACITY);
            prop_assert!(usize::from(t.scan_count()) <= 10);
            // At most one controller drives the motor.
            let init_running = !matches!(t.init_step(), InitStep::Idle | InitStep::Error);
            prop_assert!(!(init_running && t.target_qei().is_some()));
            // Entries are newest first.
            let stamps: Vec<u64> = t.log().entries().map(|e| e.at_ms).collect();
            prop_assert!(stamps.windows(2).all(|w| w[0] >= w[1]));
        }
    }
}
