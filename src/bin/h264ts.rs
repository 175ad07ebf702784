use clap::Parser;
use h264ts::codec::h264::split_access_units;
use h264ts::{StreamerConfig, StreamingSession};
use std::path::PathBuf;
use std::process::ExitCode;

/// Stream an Annex B H.264 file into MPEG-TS
#[derive(Parser)]
#[command(name = "h264ts")]
#[command(version, about, long_about = None)]
struct Args {
    /// Annex B elementary stream (.h264)
    input: PathBuf,

    /// Output file, udp://host:port or tcp://host:port
    output: String,

    /// Frame rate used to timestamp access units
    #[arg(long)]
    fps: Option<u32>,

    /// Picture width advertised in the stream parameters
    #[arg(long)]
    width: Option<u32>,

    /// Picture height advertised in the stream parameters
    #[arg(long)]
    height: Option<u32>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failed) => {
            log::error!("{} access units could not be streamed", failed);
            ExitCode::FAILURE
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Streams every access unit of the input; returns how many failed.
async fn run(args: Args) -> Result<usize, Box<dyn std::error::Error>> {
    let mut config = StreamerConfig::load()?;
    config.destination = args.output;
    if let Some(fps) = args.fps {
        config.fps = fps;
    }
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    config.validate()?;

    let data = tokio::fs::read(&args.input).await?;
    let units = split_access_units(&data);
    log::info!(
        "streaming {} access units from {} to {}",
        units.len(),
        args.input.display(),
        config.destination
    );

    let fps = i64::from(config.fps);
    let mut session = StreamingSession::from_config(config);
    session.open().await?;

    let mut failed = 0;
    for (i, unit) in units.into_iter().enumerate() {
        let timestamp = i as i64 * 1_000_000 / fps;
        if session.stream_encoded_data(unit, timestamp).await.is_err() {
            failed += 1;
        }
    }

    session.close().await?;
    Ok(failed)
}
