use anyhow::{anyhow, bail, Context};
use peerpair::ui::{HeadlessSurface, UiThread};
use peerpair::{DeviceEnumerator, LoopbackSession, PeerPairConfig, RtcEngine, SystemDevices};
use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const USAGE: &str = "Usage: peerpair <command> [args]

Commands:
  run [--config PATH] [--duration SECS] [--json]
  list-devices [--json]
  write-config PATH";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    peerpair::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    }

    let command = &args[1];
    match command.as_str() {
        "run" => cmd_run(&args).await,
        "list-devices" => cmd_list_devices(&args),
        "write-config" => cmd_write_config(&args),
        "--help" | "-h" | "help" => {
            println!("{}", USAGE);
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            eprintln!("{}", USAGE);
            std::process::exit(1);
        }
    }
}

async fn cmd_run(args: &[String]) -> anyhow::Result<()> {
    let mut config_path = None;
    let mut duration = Duration::from_secs(5);
    let mut json = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                let path = args.get(i).ok_or_else(|| anyhow!("--config needs a path"))?;
                config_path = Some(PathBuf::from(path));
            }
            "--duration" => {
                i += 1;
                let secs = args
                    .get(i)
                    .ok_or_else(|| anyhow!("--duration needs a value"))?
                    .parse::<u64>()
                    .context("--duration must be a whole number of seconds")?;
                duration = Duration::from_secs(secs);
            }
            "--json" => json = true,
            other => bail!("Unexpected argument: {}", other),
        }
        i += 1;
    }

    let config = match config_path {
        Some(path) => PeerPairConfig::load_from_file(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => PeerPairConfig::load_or_default(),
    };
    config.validate()?;

    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })
    .context("installing Ctrl+C handler")?;

    let (ui_thread, ui) = UiThread::spawn(HeadlessSurface::new)?;

    let session =
        LoopbackSession::establish(&RtcEngine::new(), &SystemDevices::new(), &ui, &config).await?;
    if session.initiator_tracks().is_audio_only() {
        log::warn!("Running audio-only: {:?}", session.initiator_tracks().degradations);
    }

    let outcome = session.negotiate().await;
    if let Err(e) = &outcome {
        log::error!("Negotiation failed: {}", e);
    } else {
        let started = Instant::now();
        while started.elapsed() < duration && !stop.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    let stats = session.stats();
    session.close().await?;
    let handled = ui_thread.shutdown()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!(
            "initiator: {} offers, {} remote descriptions, {} tracks announced",
            stats.initiator.offers_created,
            stats.initiator.remote_descriptions_applied,
            stats.initiator.tracks_announced
        );
        println!(
            "responder: {} answers, {} remote descriptions, {} tracks announced",
            stats.responder.answers_created,
            stats.responder.remote_descriptions_applied,
            stats.responder.tracks_announced
        );
        println!("UI thread handled {} messages", handled);
    }

    outcome.map_err(Into::into)
}

fn cmd_list_devices(args: &[String]) -> anyhow::Result<()> {
    let devices = SystemDevices::new().list_devices()?;
    if args.contains(&"--json".to_string()) {
        println!("{}", serde_json::to_string(&devices)?);
    } else if devices.is_empty() {
        println!("No capture devices found");
    } else {
        for d in devices {
            println!("{}: {}", d.id, d.name);
        }
    }
    Ok(())
}

fn cmd_write_config(args: &[String]) -> anyhow::Result<()> {
    let path = match args.get(2) {
        Some(path) => PathBuf::from(path),
        None => PeerPairConfig::default_path(),
    };
    PeerPairConfig::default().save_to_file(&path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
