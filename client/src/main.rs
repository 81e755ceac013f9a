use clap::Parser;
use client::bot::Bot;
use client::network::Client;
use log::info;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port; 2009 plays Hot, 2010 plays Cool
    #[arg(short = 'p', long, default_value = "2009")]
    port: u16,

    /// Display name sent to the server
    #[arg(short = 'n', long, default_value = "rusty")]
    name: String,

    /// Seconds to wait for any line from the server
    #[arg(long, default_value = "90")]
    read_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Connecting to {}:{} as {}", args.host, args.port, args.name);
    let mut client = Client::connect(&args.host, args.port, &args.name)
        .await?
        .with_read_timeout(Duration::from_secs(args.read_timeout));
    let mut bot = Bot::default();

    let mut turns = 0;
    loop {
        let around = client.ready().await?;
        if around.is_game_over() {
            break;
        }

        let action = bot.choose(&around);
        let response = client.act(action).await?;
        turns += 1;
        info!("Turn {}: {} -> {}", turns, action, response);
        if response.is_game_over() {
            break;
        }
    }

    info!("Game over after {} turn(s)", turns);
    client.disconnect().await;

    Ok(())
}
