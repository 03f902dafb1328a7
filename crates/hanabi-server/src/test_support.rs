//! In-memory connections for exercising the server without sockets.

use std::time::Duration;

use hanabi_core::line_transport::{LineReader, LineTransport, LineWriter};
use hanabi_core::transport::{Transport, TransportReader, TransportWriter};
use tokio::io::{DuplexStream, ReadHalf, WriteHalf};

pub type PipeTransport = LineTransport<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;

/// Scripted client on the far end of a [`pipe`].
pub struct TestClient {
    rx: LineReader<ReadHalf<DuplexStream>>,
    tx: LineWriter<WriteHalf<DuplexStream>>,
}

/// A connected pair: the server-side transport and a client to drive it.
pub fn pipe() -> (PipeTransport, TestClient) {
    let (server_side, client_side) = tokio::io::duplex(64 * 1024);
    let (sr, sw) = tokio::io::split(server_side);
    let (cr, cw) = tokio::io::split(client_side);
    let (rx, tx) = LineTransport::new(cr, cw).split();
    (LineTransport::new(sr, sw), TestClient { rx, tx })
}

impl TestClient {
    /// Read lines until one contains `needle`, failing after a few seconds.
    pub async fn expect(&mut self, needle: &str) -> String {
        let mut lines = self.lines_until(needle).await;
        lines.pop().unwrap_or_default()
    }

    /// Every line received up to and including the first one containing
    /// `needle`.
    pub async fn lines_until(&mut self, needle: &str) -> Vec<String> {
        let search = async {
            let mut seen = Vec::new();
            loop {
                match self.rx.recv().await {
                    Ok(Some(line)) => {
                        let found = line.contains(needle);
                        seen.push(line);
                        if found {
                            return seen;
                        }
                    }
                    Ok(None) | Err(_) => panic!("connection ended before {needle:?}"),
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(5), search)
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {needle:?}"))
    }

    /// Read until the server closes the connection.
    pub async fn expect_closed(&mut self) {
        let drain = async { while let Ok(Some(_)) = self.rx.recv().await {} };
        tokio::time::timeout(Duration::from_secs(5), drain)
            .await
            .expect("connection was not closed");
    }

    pub async fn say(&mut self, text: &str) {
        self.tx.send(text).await.expect("client write failed");
    }

    /// Wait for a prompt containing `needle`, then answer it.
    pub async fn say_after(&mut self, needle: &str, text: &str) {
        self.expect(needle).await;
        self.say(text).await;
    }
}
