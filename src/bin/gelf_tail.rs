use clap::Parser;
use graylog_gelf::core::decoder::{decode_payload, ChunkAssembler};
use graylog_gelf::utils::logger;
use tokio::net::UdpSocket;

#[derive(Parser)]
#[command(name = "gelf-tail")]
#[command(about = "Receive GELF UDP messages and print them as JSON lines")]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0:12202")]
    bind: String,

    /// Pretty-print each message
    #[arg(long)]
    pretty: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Write diagnostics to stderr as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    let socket = UdpSocket::bind(&args.bind).await?;
    tracing::info!("🚀 Listening for GELF on udp://{}", socket.local_addr()?);

    let mut assembler = ChunkAssembler::default();
    let mut buf = vec![0u8; 65_535];

    loop {
        let (len, peer) = tokio::select! {
            received = socket.recv_from(&mut buf) => received?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("👋 Shutting down");
                return Ok(());
            }
        };

        let evicted = assembler.evict_expired();
        if evicted > 0 {
            tracing::warn!("Dropped {} incomplete chunked message(s)", evicted);
        }

        let payload = match assembler.push(&buf[..len]) {
            Ok(Some(payload)) => payload,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!("Invalid datagram from {}: {}", peer, e);
                continue;
            }
        };

        match decode_payload(&payload) {
            Ok(message) if args.pretty => println!("{}", serde_json::to_string_pretty(&message)?),
            Ok(message) => println!("{}", message),
            Err(e) => tracing::warn!("Could not decode GELF from {}: {}", peer, e),
        }
    }
}
