//! Drives one CLI command against the engine and collects what happened.
//!
//! Everything except `init --realtime` runs on the simulated-time
//! `Scheduler`, so a full homing and scan finishes in milliseconds of wall
//! time. Operational outcomes (init fault, move timeout, refused operation)
//! come back as `RunReport::failure` alongside the final snapshot; only
//! misuse and setup problems are returned as errors.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use eyre::{Result, WrapErr};
use turntable_config::Config;
use turntable_core::{
    Command, InitFault, InitStep, Inventory, OpOutcome, Reply, Runner, Scheduler, SlotIndex,
    Snapshot, Station, Turntable, TurntableBuilder, TurntableError,
};
use turntable_traits::clock::MonotonicClock;

use crate::cli::{Commands, SlotArgs};

/// Simulated-time budget for homing plus a full scan.
const INIT_LIMIT_MS: u64 = 600_000;
/// Simulated-time budget for a single positioning move.
const MOVE_LIMIT_MS: u64 = 120_000;

#[derive(Debug)]
pub struct RunReport {
    pub command: &'static str,
    pub sim_ms: u64,
    pub target_qei: Option<u16>,
    pub outcome: Option<OpOutcome>,
    pub snapshot: Snapshot,
    pub failure: Option<TurntableError>,
}

impl RunReport {
    fn new(command: &'static str, t: &Turntable) -> Self {
        Self {
            command,
            sim_ms: t.now_ms(),
            target_qei: None,
            outcome: None,
            snapshot: t.snapshot(),
            failure: None,
        }
    }
}

/// Build the engine from config, preferring `--inventory` over `[inventory] csv`.
pub fn build_engine(cfg: &Config, inventory_csv: Option<&Path>) -> Result<Turntable> {
    let mut builder = TurntableBuilder::from_config(cfg);
    if let Some(path) = inventory_csv.or(cfg.inventory.csv.as_deref()) {
        let rows = turntable_config::load_inventory_csv(path)
            .wrap_err_with(|| format!("load inventory CSV {}", path.display()))?;
        builder = builder.with_inventory(Inventory::from_rows(&rows)?);
    }
    builder.build()
}

pub fn run(cmd: &Commands, engine: Turntable) -> Result<RunReport> {
    match cmd {
        Commands::Init { realtime: true } => run_init_realtime(engine),
        Commands::Init { realtime: false } => run_init_sim("init", engine),
        Commands::SelfCheck => run_init_sim("self-check", engine),
        Commands::Move { slot, station } => {
            let station: Station = station.parse()?;
            run_positioned("move", engine, *slot, station, None)
        }
        Commands::Dispense { slot, p2 } => {
            let station = if *p2 {
                Station::Dispense2P
            } else {
                Station::Dispense1P
            };
            let op = Command::Dispense(SlotIndex::try_from(slot.slot)?);
            run_positioned("dispense", engine, *slot, station, Some(op))
        }
        Commands::Refill { slot, qr } => {
            let op = Command::Refill {
                slot: SlotIndex::try_from(slot.slot)?,
                qr: qr.clone(),
            };
            run_positioned("refill", engine, *slot, Station::Refill, Some(op))
        }
        Commands::Reject { slot } => {
            let op = Command::Reject(SlotIndex::try_from(slot.slot)?);
            run_positioned("reject", engine, *slot, Station::Reject, Some(op))
        }
    }
}

/// Start initialization and tick until it completes or faults.
fn initialize(sched: &mut Scheduler) -> Result<Option<TurntableError>> {
    sched.apply(Command::StartInitialization);
    sched
        .run_until(
            |t| t.is_initialized() || t.last_fault().is_some(),
            INIT_LIMIT_MS,
        )
        .wrap_err("initialization did not finish")?;
    Ok(sched.engine().last_fault().cloned())
}

fn run_init_sim(command: &'static str, engine: Turntable) -> Result<RunReport> {
    let mut sched = Scheduler::new(engine);
    let failure = initialize(&mut sched)?;
    tracing::info!(
        command,
        sim_ms = sched.now_ms(),
        cards = sched.engine().inventory().card_count(),
        ok = failure.is_none(),
        "initialization finished"
    );
    let mut report = RunReport::new(command, sched.engine());
    report.failure = failure;
    Ok(report)
}

fn run_init_realtime(engine: Turntable) -> Result<RunReport> {
    let home_timeout_ms = engine.timing().home_timeout_ms;
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&interrupted);
        ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
            .wrap_err("install Ctrl-C handler")?;
    }

    let runner = Runner::spawn(engine, MonotonicClock::new());
    runner.send(Command::StartInitialization)?;
    let snapshot = runner.wait_for(|s| {
        s.initialized || s.init_step == InitStep::Error || interrupted.load(Ordering::Relaxed)
    })?;
    runner.request_stop();
    if interrupted.load(Ordering::Relaxed) && !snapshot.initialized {
        eyre::bail!("initialization interrupted by Ctrl-C at {} ms", snapshot.at_ms);
    }

    let failure = (snapshot.init_step == InitStep::Error)
        .then_some(TurntableError::Init(InitFault::HomeTimeout(home_timeout_ms)));
    Ok(RunReport {
        command: "init",
        sim_ms: snapshot.at_ms,
        target_qei: None,
        outcome: None,
        snapshot,
        failure,
    })
}

/// Initialize (or skip it), bring `args.slot` to `station`, then apply `op`.
fn run_positioned(
    command: &'static str,
    engine: Turntable,
    args: SlotArgs,
    station: Station,
    op: Option<Command>,
) -> Result<RunReport> {
    let slot = SlotIndex::try_from(args.slot)?;
    let mut sched = Scheduler::new(engine);

    if args.skip_init {
        // Activates the ticks; the move below pre-empts the homing sequence.
        sched.apply(Command::StartInitialization);
    } else if let Some(fault) = initialize(&mut sched)? {
        let mut report = RunReport::new(command, sched.engine());
        report.failure = Some(fault);
        return Ok(report);
    }

    let target_qei = match sched.apply(Command::MoveTo { slot, station }) {
        Reply::MoveStarted { target_qei } => target_qei,
        other => eyre::bail!("unexpected reply to move: {other:?}"),
    };
    sched
        .run_until(|t| t.target_qei().is_none(), MOVE_LIMIT_MS)
        .wrap_err_with(|| format!("move of slot {slot} to {station}"))?;

    let mut failure = sched.engine().last_fault().cloned();
    let mut outcome = None;
    // A timed-out move leaves the slot unparked; skip the operation.
    let op = if failure.is_none() { op } else { None };
    if let Some(op) = op {
        let name = op.name();
        match sched.apply(op) {
            Reply::Op(o) => {
                if let OpOutcome::Rejected(why) = o {
                    failure = Some(TurntableError::Rejected(format!("{name} slot {slot}: {why}")));
                }
                outcome = Some(o);
            }
            other => eyre::bail!("unexpected reply to {name}: {other:?}"),
        }
    }
    tracing::info!(
        command,
        slot = %slot,
        station = %station,
        target_qei,
        sim_ms = sched.now_ms(),
        ok = failure.is_none(),
        "command finished"
    );

    let mut report = RunReport::new(command, sched.engine());
    report.target_qei = Some(target_qei);
    report.outcome = outcome;
    report.failure = failure;
    Ok(report)
}
