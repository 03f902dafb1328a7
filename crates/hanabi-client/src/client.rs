//! Relay between the terminal and the server.
//!
//! Everything the server sends is printed as it arrives; every line typed on
//! stdin is sent unchanged.  The server does all validation, so the client
//! needs no game logic.

use hanabi_core::line_transport::TcpTransport;
use hanabi_core::transport::{Transport, TransportError, TransportReader, TransportWriter};
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn start_client(address: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (server, mut outbound) = TcpTransport::connect(address).await?.split();
    let mut printer = tokio::spawn(print_incoming(server));
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            finished = &mut printer => {
                finished??;
                println!("Server closed the connection.");
                return Ok(());
            }
            typed = stdin.next_line() => match typed? {
                Some(line) => outbound.send(&line).await?,
                // stdin closed: keep printing until the server hangs up.
                None => {
                    printer.await??;
                    return Ok(());
                }
            },
        }
    }
}

async fn print_incoming(mut server: impl TransportReader) -> Result<(), TransportError> {
    while let Some(line) = server.recv().await? {
        println!("{line}");
    }
    Ok(())
}
