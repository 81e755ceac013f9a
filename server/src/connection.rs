//! Line-oriented player connection with a per-message receive deadline
//!
//! Every read waits for one `\n`-terminated line. A peer that goes quiet for
//! longer than the deadline, closes its socket, or hangs up mid-line produces
//! a fatal error; there is no partial-read recovery. Lines are capped at
//! [`MAX_LINE_LEN`] bytes.

use log::debug;
use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Default idle deadline for a single received line
pub const RECEIVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest line a peer may send, terminator included
pub const MAX_LINE_LEN: usize = 4096;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("no line from {peer} within {timeout:?}")]
    Timeout { peer: String, timeout: Duration },
    #[error("{peer} sent a line longer than {limit} bytes")]
    LineTooLong { peer: String, limit: usize },
    #[error("connection to {0} is closed")]
    Closed(String),
    #[error("i/o error on {peer}: {source}")]
    Io {
        peer: String,
        #[source]
        source: io::Error,
    },
}

/// A player's socket, exclusively owned by the match for its whole lifetime
#[derive(Debug)]
pub struct Connection<S = TcpStream> {
    stream: Option<BufReader<S>>,
    peer: String,
    timeout: Duration,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, peer: impl Into<String>, timeout: Duration) -> Self {
        Self {
            stream: Some(BufReader::new(stream)),
            peer: peer.into(),
            timeout,
        }
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn io_error(&self, source: io::Error) -> ConnectionError {
        ConnectionError::Io {
            peer: self.peer.clone(),
            source,
        }
    }

    /// Writes `line` exactly as given; the caller supplies the terminator
    pub async fn send(&mut self, line: &str) -> Result<(), ConnectionError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(ConnectionError::Closed(self.peer.clone()));
        };

        let written = async {
            stream.write_all(line.as_bytes()).await?;
            stream.flush().await
        }
        .await;

        written.map_err(|e| self.io_error(e))
    }

    /// Reads the raw bytes of the next line, terminator stripped
    pub async fn receive_bytes(&mut self) -> Result<Vec<u8>, ConnectionError> {
        let deadline = self.timeout;
        let Some(stream) = self.stream.as_mut() else {
            return Err(ConnectionError::Closed(self.peer.clone()));
        };

        let mut buf = Vec::new();
        let mut limited = stream.take(MAX_LINE_LEN as u64);
        let read = timeout(deadline, limited.read_until(b'\n', &mut buf)).await;

        match read {
            Err(_) => Err(ConnectionError::Timeout {
                peer: self.peer.clone(),
                timeout: deadline,
            }),
            Ok(Err(e)) => Err(self.io_error(e)),
            Ok(Ok(_)) if buf.len() >= MAX_LINE_LEN && buf.last() != Some(&b'\n') => {
                Err(ConnectionError::LineTooLong {
                    peer: self.peer.clone(),
                    limit: MAX_LINE_LEN,
                })
            }
            Ok(Ok(_)) if buf.last() != Some(&b'\n') => {
                debug!("{} hung up with {} unterminated byte(s)", self.peer, buf.len());
                Err(ConnectionError::Closed(self.peer.clone()))
            }
            Ok(Ok(_)) => {
                while matches!(buf.last(), Some(b'\n' | b'\r')) {
                    buf.pop();
                }
                Ok(buf)
            }
        }
    }

    /// Reads the next line with surrounding whitespace removed
    pub async fn receive(&mut self) -> Result<String, ConnectionError> {
        let bytes = self.receive_bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).trim().to_string())
    }

    /// Shuts the socket down. Safe to call any number of times.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!("Shutdown of {} failed: {}", self.peer, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt};
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_send_writes_verbatim() {
        let mock = Builder::new().write(b"Ready\n").write(b"1000000000\n").build();
        let mut conn = Connection::new(mock, "mock", RECEIVE_TIMEOUT);

        conn.send("Ready\n").await.unwrap();
        conn.send("1000000000\n").await.unwrap();
    }

    #[tokio::test]
    async fn test_receive_strips_terminators_and_whitespace() {
        let mock = Builder::new()
            .read(b"gr\r\n")
            .read(b"  wk 1 \r\n")
            .build();
        let mut conn = Connection::new(mock, "mock", RECEIVE_TIMEOUT);

        assert_eq!(conn.receive().await.unwrap(), "gr");
        assert_eq!(conn.receive().await.unwrap(), "wk 1");
    }

    #[tokio::test]
    async fn test_receive_reassembles_split_lines() {
        let mock = Builder::new().read(b"Alic").read(b"e\nsc").read(b" 2\r\n").build();
        let mut conn = Connection::new(mock, "mock", RECEIVE_TIMEOUT);

        assert_eq!(conn.receive().await.unwrap(), "Alice");
        assert_eq!(conn.receive().await.unwrap(), "sc 2");
    }

    #[tokio::test]
    async fn test_receive_bytes_keeps_raw_name() {
        let mock = Builder::new().read(&[0x83, 0x65, b'\r', b'\n']).build();
        let mut conn = Connection::new(mock, "mock", RECEIVE_TIMEOUT);

        assert_eq!(conn.receive_bytes().await.unwrap(), vec![0x83, 0x65]);
    }

    #[tokio::test]
    async fn test_receive_times_out() {
        let (server_side, _client_side) = duplex(64);
        let mut conn = Connection::new(server_side, "quiet", Duration::from_millis(50));

        let err = conn.receive().await.unwrap_err();
        assert!(matches!(err, ConnectionError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_overlong_line_is_fatal() {
        let flood = vec![b'a'; MAX_LINE_LEN + 10];
        let mock = Builder::new().read(&flood).build();
        let mut conn = Connection::new(mock, "flood", RECEIVE_TIMEOUT);

        assert!(matches!(
            conn.receive().await,
            Err(ConnectionError::LineTooLong { limit: MAX_LINE_LEN, .. })
        ));
    }

    #[tokio::test]
    async fn test_peer_close_is_fatal() {
        let mock = Builder::new().read(b"partial").build();
        let mut conn = Connection::new(mock, "mock", RECEIVE_TIMEOUT);
        assert!(matches!(
            conn.receive().await,
            Err(ConnectionError::Closed(_))
        ));

        let mock = Builder::new().build();
        let mut conn = Connection::new(mock, "mock", RECEIVE_TIMEOUT);
        assert!(matches!(
            conn.receive().await,
            Err(ConnectionError::Closed(_))
        ));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (server_side, mut client_side) = duplex(64);
        let mut conn = Connection::new(server_side, "peer", RECEIVE_TIMEOUT);

        conn.send("#\n").await.unwrap();
        conn.close().await;
        conn.close().await;
        assert!(!conn.is_open());

        assert!(matches!(conn.send("x\n").await, Err(ConnectionError::Closed(_))));
        assert!(matches!(conn.receive().await, Err(ConnectionError::Closed(_))));

        let mut received = String::new();
        client_side.read_to_string(&mut received).await.unwrap();
        assert_eq!(received, "#\n");
    }
}
