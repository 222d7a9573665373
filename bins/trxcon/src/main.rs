use clap::Parser;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use trx_config::{SharedConfig, toml_config};
use trx_core::arfcn::BandArfcn;
use trx_core::{FrameNumber, STACK_VERSION, debug};
use trx_if::{CtrlError, SessionEvent, TrxCmd, TrxInterface};
use trx_l1sched::clock::FrameClock;
use trx_l1sched::{L1Event, Scheduler, TxBurst};

/// Longest the event loop sleeps without checking its sockets
const MAX_IDLE: Duration = Duration::from_millis(1);

/// Load configuration file
fn load_config_from_toml(cfg_path: &str) -> SharedConfig {
    match toml_config::from_file(cfg_path) {
        Ok(c) => c,
        Err(e) => {
            println!("Failed to load configuration from {}: {}", cfg_path, e);
            std::process::exit(1);
        }
    }
}

/// Queues the transceiver bring-up sequence and configures the scheduler timeslots
fn start_session(cfg: &SharedConfig, trx: &mut TrxInterface, sched: &mut Scheduler) -> Result<(), CtrlError> {
    let c = cfg.config();
    let radio = &c.radio;
    let now = Instant::now();

    trx.submit(TrxCmd::Echo, now)?;
    trx.submit(TrxCmd::PowerOff, now)?;
    trx.submit(TrxCmd::rx_tune(radio.arfcn())?, now)?;
    trx.submit(TrxCmd::tx_tune(radio.arfcn())?, now)?;
    if radio.ta != 0 {
        trx.submit(TrxCmd::SetTa(radio.ta), now)?;
    }
    if let Some(h) = &radio.hopping {
        let ma: Vec<BandArfcn> = h.ma.iter().map(|&a| BandArfcn::new(a, radio.pcs)).collect();
        trx.submit(TrxCmd::set_fh(h.hsn, h.maio, &ma)?, now)?;
    }

    for ts in &radio.timeslots {
        if let Err(e) = sched.configure(ts.tn, ts.pchan) {
            tracing::error!("Failed to configure TS{} as {:?}: {}", ts.tn, ts.pchan, e);
        }
    }
    // SETSLOT for every timeslot that was configured
    handle_l1_events(sched, trx)?;

    trx.submit(TrxCmd::PowerOn, now)
}

/// Forwards scheduler events. Timeslot changes become SETSLOT commands.
fn handle_l1_events(sched: &mut Scheduler, trx: &mut TrxInterface) -> Result<(), CtrlError> {
    for event in sched.drain_events() {
        match event {
            L1Event::PchanComb { tn, config } => {
                trx.submit(TrxCmd::set_slot(tn, config), Instant::now())?;
            }
            L1Event::DataInd { frame, tn, chan_nr, link_id, bits, meas, lost_bursts, traffic } => {
                tracing::debug!(
                    frame = frame.value(),
                    "DATA.ind TS{} chan_nr=0x{:02x} link_id=0x{:02x} len={} rssi={} toa256={} lost={} traffic={}",
                    tn,
                    chan_nr,
                    link_id,
                    bits.len(),
                    meas.rssi,
                    meas.toa256,
                    lost_bursts,
                    traffic
                );
            }
            L1Event::DataCnf { frame, tn, chan_nr, link_id } => {
                tracing::debug!(frame = frame.value(), "DATA.cnf TS{} chan_nr=0x{:02x} link_id=0x{:02x}", tn, chan_nr, link_id);
            }
            L1Event::SchInd { frame, tn, meas, .. } => {
                tracing::debug!(frame = frame.value(), "SCH TS{} rssi={} toa256={}", tn, meas.rssi, meas.toa256);
            }
        }
    }
    Ok(())
}

/// Pulls and sends the uplink bursts of every clock tick
fn transmit(sched: &mut Scheduler, trx: &mut TrxInterface, ticks: Vec<FrameNumber>) {
    for clock_fn in ticks {
        let bursts: Vec<TxBurst> = sched.pull_frame(clock_fn);
        for burst in &bursts {
            if let Err(e) = trx.tx_burst(burst) {
                tracing::warn!("Failed to send burst for TS{}: {}", burst.tn, e);
            }
        }
    }
}

fn run(cfg: &SharedConfig, trx: &mut TrxInterface, running: Arc<AtomicBool>) {
    let mut sched = Scheduler::new(cfg);
    let mut clock = FrameClock::new(&cfg.config().clock);

    if let Err(e) = start_session(cfg, trx, &mut sched) {
        tracing::error!("Failed to start transceiver session: {}", e);
        return;
    }

    while running.load(Ordering::SeqCst) {
        let now = Instant::now();

        for event in trx.poll_ctrl(now) {
            match event {
                SessionEvent::Fatal(reason) => {
                    tracing::error!("Transceiver session failed: {}", reason);
                    return;
                }
                SessionEvent::Measurement { khz, dbm } => {
                    tracing::info!("Power measurement {} kHz: {} dBm", khz, dbm);
                }
                SessionEvent::Send(_) => {}
            }
        }

        for ind in trx.poll_data() {
            let frame = ind.frame;
            if let Err(e) = sched.push(ind.into_burst()) {
                tracing::debug!(frame = frame.value(), "Burst not processed: {}", e);
            }
            // Every 51st frame disciplines the clock
            if frame.value() % 51 == 0 {
                let ticks = clock.handle(frame, now);
                transmit(&mut sched, trx, ticks);
            }
        }

        let ticks = clock.tick(Instant::now());
        transmit(&mut sched, trx, ticks);

        if let Err(e) = handle_l1_events(&mut sched, trx) {
            tracing::error!("Failed to queue timeslot setup: {}", e);
            return;
        }

        let now = Instant::now();
        let wake = [clock.deadline(), trx.deadline()]
            .into_iter()
            .flatten()
            .fold(now + MAX_IDLE, |a, b| a.min(b));
        if wake > now {
            std::thread::sleep(wake - now);
        }
    }
    tracing::info!("Interrupted, shutting down");
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "GSM transceiver client",
    long_about = "Drives a TRX over its UDP control and burst interface, runs the TDMA scheduler against it"
)]

struct Args {
    /// Config file (required)
    #[arg(help = "TOML config with transceiver and radio parameters")]
    config: String,
}

fn main() {
    eprintln!("░▀█▀░█▀▄░█░█░█▀▀░█▀█░█▀█");
    eprintln!("░░█░░█▀▄░▄▀▄░█░░░█░█░█░█");
    eprintln!("░░▀░░▀░▀░▀░▀░▀▀▀░▀▀▀░▀░▀\n");
    eprintln!(" -> version {}\n", STACK_VERSION);

    let args = Args::parse();
    let cfg = load_config_from_toml(&args.config);
    let _log_guard = debug::setup_logging_default(cfg.config().debug_log.clone());

    let mut trx = match TrxInterface::open(&cfg) {
        Ok(trx) => trx,
        Err(e) => {
            println!("Failed to open transceiver interface: {}", e);
            std::process::exit(1);
        }
    };

    // Set up Ctrl+C handler for graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("failed to set Ctrl+C handler");

    run(&cfg, &mut trx, running);
    trx.close();
}
