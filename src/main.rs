use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sigfox_rs::logging::{init_logger_with_default, log_warn};
use sigfox_rs::util::ThrottleManager;
use sigfox_rs::{
    log_info, BoardType, DecoderConfig, EnergyResetTracker, Family, JsonLinesSink,
    LineProtocolSink, RecordSink, Uplink, UplinkDecoder,
};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Parser)]
#[command(name = "sigfox-cli")]
#[command(about = "Decode Sigfox uplink payloads into time-series records")]
struct Cli {
    /// JSON decoder configuration (device registry, settings, static lookups)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output encoding
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Line)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// InfluxDB line protocol
    Line,
    /// One JSON object per record
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a single payload
    Decode {
        #[arg(long)]
        family: Family,
        #[arg(long)]
        device: String,
        /// Reception time, seconds since the epoch
        #[arg(long)]
        time: i64,
        #[arg(long)]
        payload: String,
    },
    /// Decode newline-delimited callback bodies from a file ("-" for stdin)
    Replay { file: PathBuf },
    /// Print the frame-length table of a family
    Frames {
        #[arg(long)]
        family: Family,
    },
}

fn load_config(path: Option<&Path>) -> Result<DecoderConfig> {
    match path {
        Some(path) => DecoderConfig::from_json_file(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(DecoderConfig::default()),
    }
}

fn open_sink(format: OutputFormat) -> Box<dyn RecordSink> {
    let stdout = BufWriter::new(io::stdout());
    match format {
        OutputFormat::Line => Box::new(LineProtocolSink::new(stdout)),
        OutputFormat::Json => Box::new(JsonLinesSink::new(stdout)),
    }
}

fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

#[derive(Default)]
struct ReplayStats {
    decoded: usize,
    unrecognized: usize,
    skipped: usize,
}

fn replay(
    decoder: &UplinkDecoder<'_>,
    input: impl BufRead,
    sink: &mut dyn RecordSink,
) -> Result<ReplayStats> {
    let mut stats = ReplayStats::default();

    for (index, line) in input.lines().enumerate() {
        let line = line.context("reading replay input")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let uplink: Uplink = match serde_json::from_str(line) {
            Ok(uplink) => uplink,
            Err(err) => {
                log_warn(&format!("line {}: not a callback body: {err}", index + 1));
                stats.skipped += 1;
                continue;
            }
        };
        let decoded = decoder.resolve_family(&uplink).and_then(|family| {
            decoder
                .decode(family, uplink.time, &uplink.device, &uplink.data)
                .map(|decoded| (family, decoded))
        });
        match decoded {
            Ok((family, decoded)) if decoded.recognized => {
                sink.write_batch(family, &decoded.records)?;
                stats.decoded += 1;
            }
            Ok(_) => stats.unrecognized += 1,
            Err(err) => {
                log_warn(&format!("line {}: {err}", index + 1));
                stats.skipped += 1;
            }
        }
    }

    Ok(stats)
}

fn print_frames(family: Family) -> Result<()> {
    let mut out = io::stdout().lock();
    if family == Family::DistributedIo {
        for board in BoardType::ALL {
            writeln!(out, "0x{:02x} {board}: {:?}", board.id(), board.body_lengths())?;
        }
    } else {
        writeln!(out, "{family}: {:?}", family.frame_lengths())?;
    }
    Ok(())
}

fn main() -> Result<()> {
    init_logger_with_default("warn");

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let registry = config.build_registry()?;
    let energy = EnergyResetTracker::new();
    let throttle = Mutex::new(ThrottleManager::new());
    let decoder = UplinkDecoder::new(&registry, &config.lookups, &energy, config.settings)
        .with_log_throttle(&throttle);

    match cli.command {
        Commands::Decode {
            family,
            device,
            time,
            payload,
        } => {
            let decoded = decoder
                .decode(family, time, &device, &payload)
                .with_context(|| format!("decoding {family} payload {payload}"))?;
            if !decoded.recognized {
                anyhow::bail!("{family} payload {payload} matches no frame");
            }
            let mut sink = open_sink(cli.format);
            sink.write_batch(family, &decoded.records)?;
            sink.flush()?;
        }
        Commands::Replay { file } => {
            let input = open_input(&file)?;
            let mut sink = open_sink(cli.format);
            let stats = replay(&decoder, input, sink.as_mut())?;
            sink.flush()?;
            log_info(&format!(
                "replayed {}: {} decoded, {} unrecognized, {} skipped",
                file.display(),
                stats.decoded,
                stats.unrecognized,
                stats.skipped
            ));
        }
        Commands::Frames { family } => print_frames(family)?,
    }

    Ok(())
}
