use clap::Parser;
use log::{error, info};
use server::network::Server;
use shared::board::Board;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind the UDP socket to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "1337")]
    port: u16,

    /// Path to the textual map file
    #[arg(short, long, default_value = "maps/default.txt")]
    map: String,

    /// Tick rate (loop iterations per second)
    #[arg(short, long, default_value = "30")]
    tick_rate: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    // An invalid map is fatal: the process must not start serving on it.
    let text = std::fs::read_to_string(&args.map)?;
    let board = match Board::parse(&text) {
        Ok(board) => board,
        Err(e) => {
            error!("invalid map {}: {}", args.map, e);
            return Err(e.into());
        }
    };
    info!(
        "loaded map {} ({}x{}, {} points)",
        args.map,
        board.rows(),
        board.cols(),
        board.point_order().len()
    );

    let addr = format!("{}:{}", args.host, args.port);
    let tick_duration = Duration::from_secs_f64(1.0 / f64::from(args.tick_rate.max(1)));

    let mut server = Server::new(&addr, board, tick_duration).await?;
    server.run().await?;
    Ok(())
}
