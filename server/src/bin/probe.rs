//! Scripted smoke client: joins a running server as a contender, walks a few
//! steps, prints every datagram it gets back, then quits.

use clap::Parser;
use shared::protocol::{ClientPacket, ServerPacket};
use shared::{Direction, Role};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{sleep, timeout};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to probe
    #[arg(short, long, default_value = "127.0.0.1:1337")]
    server: String,

    /// Role to join as: observer, pursuer or chaser
    #[arg(short, long, default_value = "pursuer")]
    role: String,

    /// Number of steps to walk before quitting
    #[arg(short = 'n', long, default_value = "8")]
    steps: u32,
}

fn parse_role(name: &str) -> Option<Role> {
    match name {
        "observer" => Some(Role::Observer),
        "pursuer" => Some(Role::Pursuer),
        "chaser" => Some(Role::Chaser),
        _ => None,
    }
}

fn describe(packet: &ServerPacket) -> String {
    match packet {
        ServerPacket::Snapshot {
            freeze,
            pursuer,
            chaser,
            attempts,
            collected,
        } => {
            let taken: u32 = collected.iter().map(|b| b.count_ones()).sum();
            format!(
                "snapshot freeze={} pursuer={:?} chaser={:?} attempts={} collected={}",
                freeze, pursuer, chaser, attempts, taken
            )
        }
        ServerPacket::GameOver {
            winner,
            score,
            catches,
        } => format!(
            "game over: winner={:?} score={} catches={}",
            winner, score, catches
        ),
        ServerPacket::Error { code } => format!("error: {:?}", code),
    }
}

/// Drain whatever the server has sent so far, printing each packet.
async fn drain(socket: &UdpSocket, buf: &mut [u8]) {
    while let Ok(Ok((len, _))) = timeout(Duration::from_millis(200), socket.recv_from(buf)).await {
        match ServerPacket::decode(&buf[..len]) {
            Ok(packet) => println!("  <- {}", describe(&packet)),
            Err(e) => println!("  <- undecodable ({} bytes): {}", len, e),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let role = parse_role(&args.role)
        .ok_or_else(|| format!("unknown role {:?} (observer/pursuer/chaser)", args.role))?;
    let server_addr = args.server.parse::<SocketAddr>()?;

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    println!("probe bound to {}", socket.local_addr()?);

    let mut buf = [0u8; 64];

    println!("-> join as {:?}", role);
    socket
        .send_to(&ClientPacket::Join { role }.encode(), server_addr)
        .await?;
    drain(&socket, &mut buf).await;

    // Observers never send moves; contenders walk a short square.
    if role != Role::Observer {
        let walk = [
            Direction::Right,
            Direction::Down,
            Direction::Left,
            Direction::Up,
        ];
        for i in 0..args.steps {
            let direction = walk[(i as usize) % walk.len()];
            println!("-> move {:?}", direction);
            socket
                .send_to(&ClientPacket::Move { direction }.encode(), server_addr)
                .await?;
            drain(&socket, &mut buf).await;
            sleep(Duration::from_millis(250)).await;
        }
    } else {
        // Just watch a couple of broadcast intervals.
        sleep(Duration::from_secs(2)).await;
        drain(&socket, &mut buf).await;
    }

    println!("-> quit");
    socket.send_to(&ClientPacket::Quit.encode(), server_addr).await?;
    drain(&socket, &mut buf).await;

    println!("probe finished");
    Ok(())
}
