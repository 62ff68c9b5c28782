#![allow(unused_crate_dependencies)]
#![allow(clippy::print_stdout)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};

use perigatt::bus::{requests, signals, Caller, ObjectPath};
use perigatt::gatt::DEFAULT_BASE;
use perigatt::host::Loopback;
use perigatt::peripheral::{Config, Peripheral};
use perigatt::profile::{Cycling, GapService};
use perigatt_const::Characteristic;

#[derive(Clone, Copy, Debug, clap::Parser)]
struct Args {
    /// Enable debug logging (repeat for trace).
    #[arg(short = 'D', long, action = clap::ArgAction::Count)]
    debug: u8,

    /// Include a Generic Access service.
    #[arg(short, long)]
    gap: bool,

    /// Stop after the specified number of seconds instead of waiting for
    /// Ctrl-C.
    #[arg(short, long)]
    seconds: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = match args.debug {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();
    // The peripheral owns its event loop, so main only waits for the thread.
    let t = std::thread::spawn(move || -> Result<()> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        rt.block_on(serve(args))
    });
    (t.join()).map_err(|_| anyhow::anyhow!("peripheral thread panicked"))?
}

async fn serve(args: Args) -> Result<()> {
    let mut profile = Cycling::new();
    if args.gap {
        profile = profile.with_gap(GapService::default());
    }
    let (bus, mut sigs) = signals();
    let app = profile.application(DEFAULT_BASE, Arc::new(bus));
    let meas = (app.services().iter())
        .flat_map(|s| s.characteristics())
        .find(|c| c.uuid() == Characteristic::CyclingPowerMeasurement)
        .map(|c| c.path().clone());
    let periph = Peripheral::new(app, Config::default())
        .with_advertisement(profile.advertisement(DEFAULT_BASE)?);

    let stop = CancellationToken::new();
    tokio::task::spawn({
        let stop = stop.clone();
        async move {
            match args.seconds {
                Some(n) => tokio::time::sleep(Duration::from_secs(n)).await,
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        warn!("Failed to wait for Ctrl-C: {e}");
                    }
                }
            }
            info!("Stopping");
            stop.cancel();
        }
    });

    let (caller, reqs) = requests(16);
    if let Some(meas) = meas {
        tokio::task::spawn(client(caller, meas));
    }
    tokio::task::spawn(async move {
        while let Some(sig) = sigs.recv().await {
            if let Some(v) = sig.value() {
                println!("{} -> {v:02X?}", sig.path());
            }
        }
    });

    let host = Loopback::new();
    periph.run(&host, reqs, stop).await?;
    for e in host.events() {
        info!("Host event: {e:?}");
    }
    Ok(())
}

/// Acts as a connected client: dumps the exposed object tree and subscribes
/// to power measurements.
async fn client(c: Caller, meas: ObjectPath) {
    match c.managed_objects(DEFAULT_BASE).await {
        Ok(objs) => {
            for (path, ifaces) in objs {
                info!("{path}: {:?}", ifaces.keys().collect::<Vec<_>>());
            }
        }
        Err(e) => warn!("GetManagedObjects failed: {e}"),
    }
    match c.start_notify(meas.clone()).await {
        Ok(()) => info!("Subscribed to {meas}"),
        Err(e) => warn!("StartNotify failed: {e}"),
    }
}
