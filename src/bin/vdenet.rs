use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};

use vde_net::prelude::*;
use vde_net::vde;

/// Longest single wait in `dump`, so SIGINT is noticed promptly
const DUMP_POLL_SLICE: Duration = Duration::from_millis(200);

#[derive(Parser, Debug)]
#[command(name = "vdenet", version, about = "Exchange Ethernet frames with a VDE switch")]
struct Cli {
    #[command(flatten)]
    switch: SwitchArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct SwitchArgs {
    /// Switch control socket (libvdeplug default if omitted)
    #[arg(long, short = 's', global = true, env = "VDE_SWITCH")]
    switch: Option<PathBuf>,

    /// YAML file with connection parameters
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Client identifier shown by the switch
    #[arg(long, global = true)]
    description: Option<String>,

    /// Switch port (0 lets the switch pick)
    #[arg(long, global = true)]
    port: Option<i32>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect and report data channel readiness
    Probe {
        /// How long to wait for readiness
        #[arg(long, default_value = "1s", value_parser = humantime::parse_duration)]
        timeout: Duration,
    },
    /// Transmit one frame
    Send {
        /// Frame payload as text
        #[arg(long, conflicts_with = "hex", required_unless_present = "hex")]
        text: Option<String>,
        /// Frame payload as hex (separators ignored)
        #[arg(long)]
        hex: Option<String>,
        /// How long to wait for the data channel to become writable
        #[arg(long, default_value = "1s", value_parser = humantime::parse_duration)]
        timeout: Duration,
    },
    /// Print received frames
    Dump {
        /// Stop after this many frames
        #[arg(long, short = 'n')]
        count: Option<u64>,
        /// Stop after this long
        #[arg(long, value_parser = humantime::parse_duration)]
        timeout: Option<Duration>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("vdenet: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli.switch)?;
    let dev = vde::create(&config)?;
    let mut pump = FramePump::new(dev);

    match cli.command {
        Command::Probe { timeout } => cmd_probe(&mut pump, timeout),
        Command::Send { text, hex, timeout } => {
            let frame = match (text, hex) {
                (Some(text), _) => text.into_bytes(),
                (None, Some(hex)) => parse_hex(&hex)?,
                (None, None) => return Err(Error::Config("send requires --text or --hex".into())),
            };
            pump.send(&frame, Some(timeout))?;
            println!("sent {} bytes", frame.len());
            Ok(())
        }
        Command::Dump { count, timeout } => cmd_dump(&mut pump, count, timeout),
    }
}

fn load_config(args: &SwitchArgs) -> Result<VdeConfig> {
    let mut config = match &args.config {
        Some(path) => VdeConfig::from_yaml_file(path)?,
        None => VdeConfig::new(),
    };
    if let Some(ref path) = args.switch {
        config = config.switch_path(path);
    }
    if let Some(ref description) = args.description {
        config = config.description(description);
    }
    if let Some(port) = args.port {
        config = config.port(port);
    }
    config.validate()?;
    Ok(config)
}

fn cmd_probe<D: NetworkDevice>(pump: &mut FramePump<D>, timeout: Duration) -> Result<()> {
    let ready = pump.wait(PollEvents::RX | PollEvents::TX, Some(timeout))?;
    println!(
        "connected: rx={} tx={}",
        ready.contains(PollEvents::RX),
        ready.contains(PollEvents::TX)
    );
    Ok(())
}

fn cmd_dump<D: NetworkDevice>(
    pump: &mut FramePump<D>,
    count: Option<u64>,
    timeout: Option<Duration>,
) -> Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&stop))?;

    let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
    let limit = count.unwrap_or(u64::MAX);

    while !stop.load(Ordering::Relaxed) && pump.stats().rx_frames < limit {
        let slice = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                (deadline - now).min(DUMP_POLL_SLICE)
            }
            None => DUMP_POLL_SLICE,
        };

        if !pump.wait(PollEvents::RX, Some(slice))?.contains(PollEvents::RX) {
            continue;
        }
        let left = limit - pump.stats().rx_frames;
        pump.drain_up_to(usize::try_from(left).unwrap_or(usize::MAX), |frame| {
            println!("{:5} bytes  {}", frame.len(), format_hex(frame));
        })?;
    }

    let stats = pump.stats();
    eprintln!("{} frames, {} bytes", stats.rx_frames, stats.rx_bytes);
    Ok(())
}

fn parse_hex(raw: &str) -> Result<Vec<u8>> {
    let digits: Vec<u8> = raw
        .bytes()
        .filter(|b| !matches!(b, b':' | b'-' | b' ' | b'\t' | b'\n'))
        .collect();
    if digits.len() % 2 != 0 {
        return Err(Error::Config(format!("odd number of hex digits in {:?}", raw)));
    }
    digits
        .chunks(2)
        .map(|pair| {
            let s = std::str::from_utf8(pair).map_err(|_| Error::Config("invalid hex".into()))?;
            u8::from_str_radix(s, 16).map_err(|_| Error::Config(format!("invalid hex byte {:?}", s)))
        })
        .collect()
}

fn format_hex(frame: &[u8]) -> String {
    frame
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
