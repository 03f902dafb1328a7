//! Newline-delimited text transport over any tokio byte stream.
//!
//! [`TcpTransport`] is what the server and the terminal client use; tests
//! plug in `tokio::io::duplex` pipes instead.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use crate::transport::{Transport, TransportError, TransportReader, TransportWriter};

/// Line transport over a TCP socket.
pub type TcpTransport = LineTransport<OwnedReadHalf, OwnedWriteHalf>;

pub struct LineTransport<R, W> {
    reader: R,
    writer: W,
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl TcpTransport {
    pub fn from_stream(stream: TcpStream) -> Self {
        let (reader, writer) = stream.into_split();
        Self::new(reader, writer)
    }

    /// Connect to a server at `address` (`host:port`).
    pub async fn connect(address: &str) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(address).await?;
        Ok(Self::from_stream(stream))
    }
}

impl<R, W> Transport for LineTransport<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    type Reader = LineReader<R>;
    type Writer = LineWriter<W>;

    fn split(self) -> (Self::Reader, Self::Writer) {
        (
            LineReader {
                reader: BufReader::new(self.reader),
                line: String::new(),
            },
            LineWriter {
                writer: self.writer,
            },
        )
    }
}

/// Read half of a [`LineTransport`].
pub struct LineReader<R> {
    reader: BufReader<R>,
    line: String,
}

impl<R> TransportReader for LineReader<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            self.line.clear();
            let bytes_read = self.reader.read_line(&mut self.line).await?;
            if bytes_read == 0 {
                return Ok(None);
            }
            let trimmed = self.line.trim();
            // Blank lines carry no answer.
            if trimmed.is_empty() {
                continue;
            }
            return Ok(Some(trimmed.to_string()));
        }
    }
}

/// Write half of a [`LineTransport`].
pub struct LineWriter<W> {
    writer: W,
}

impl<W> TransportWriter for LineWriter<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn send(&mut self, text: &str) -> Result<(), TransportError> {
        self.writer.write_all(text.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[test]
    fn reads_trimmed_lines_and_skips_blanks() {
        let mock = Builder::new().read(b"play_card\r\n\n  b \n").build();
        let (reader, writer) = tokio::io::split(mock);
        let (mut rx, _tx) = LineTransport::new(reader, writer).split();

        tokio_test::block_on(async {
            assert_eq!(rx.recv().await.unwrap().as_deref(), Some("play_card"));
            assert_eq!(rx.recv().await.unwrap().as_deref(), Some("b"));
            assert!(rx.recv().await.unwrap().is_none());
        });
    }

    #[test]
    fn writes_newline_terminated_messages() {
        let mock = Builder::new().write(b"Round 1\n").build();
        let (reader, writer) = tokio::io::split(mock);
        let (_rx, mut tx) = LineTransport::new(reader, writer).split();

        tokio_test::block_on(async {
            tx.send("Round 1").await.unwrap();
        });
    }

    #[tokio::test]
    async fn duplex_round_trip() {
        let (near, far) = tokio::io::duplex(256);
        let (near_r, near_w) = tokio::io::split(near);
        let (far_r, far_w) = tokio::io::split(far);
        let (_near_rx, mut near_tx) = LineTransport::new(near_r, near_w).split();
        let (mut far_rx, _far_tx) = LineTransport::new(far_r, far_w).split();

        near_tx.send("2").await.unwrap();
        assert_eq!(far_rx.recv().await.unwrap().as_deref(), Some("2"));
    }
}
