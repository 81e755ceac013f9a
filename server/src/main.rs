use clap::Parser;
use log::{info, warn};
use server::network::{Server, ServerConfig};
use server::recorder::{DumpRecorder, NullRecorder, Recorder};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Map file to play on
    map: PathBuf,

    /// Port for the Hot player
    #[arg(short = 'f', long, default_value = "2009")]
    first_port: u16,

    /// Port for the Cool player
    #[arg(short = 's', long, default_value = "2010")]
    second_port: u16,

    /// Address to bind both listeners to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Where to write the replay dump
    #[arg(short = 'd', long, default_value = "./chaser.dump")]
    dump_path: PathBuf,

    /// Do not write a replay dump
    #[arg(long)]
    no_dump: bool,

    /// Seconds each seat waits for its player to connect
    #[arg(long, default_value = "60")]
    accept_timeout: u64,

    /// Seconds to wait for any single line from a player
    #[arg(long, default_value = "10")]
    receive_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let map_source = std::fs::read_to_string(&args.map)?;
    let board = shared::parse_map(&map_source)?;
    info!(
        "Loaded {} ({}x{}, {} turns)",
        args.map.display(),
        board.width(),
        board.height(),
        board.max_turns()
    );

    let recorder: Box<dyn Recorder> = if args.no_dump {
        Box::new(NullRecorder)
    } else {
        info!("Writing replay to {}", args.dump_path.display());
        Box::new(DumpRecorder::create(&args.dump_path, &map_source)?)
    };

    let config = ServerConfig {
        host: args.host,
        first_port: args.first_port,
        second_port: args.second_port,
        accept_timeout: Duration::from_secs(args.accept_timeout),
        receive_timeout: Duration::from_secs(args.receive_timeout),
    };

    let mut server = Server::bind(config, board, recorder).await?;
    let report = server.run().await?;

    match report.winner_name() {
        Some(name) => info!("Winner: {} ({})", name, report.result.reason),
        None => warn!("No winner: {}", report.result.reason),
    }
    println!("{}", report.result.reason);

    Ok(())
}
