//! Client side of the CHaser text protocol
//!
//! Every call maps onto exactly one exchange with the server. The client
//! acknowledges action responses with `#` unless the response already signals
//! the end of the match, and it reads a closed socket or a bare `#` line as a
//! game-over response rather than an error. A server that stays silent past
//! the read deadline is an error.

use log::{debug, info};
use shared::codec::{NameEncodingError, ACTION_ACK, GAME_OVER, READY_ACK, READY_PROMPT};
use shared::{Action, DecodeError, Direction, NameEncoding, Response};
use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Default wait for any line from the server. Covers the opponent's whole
/// turn plus the time the server may spend waiting for them to join.
pub const READ_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("no line from the server within {0:?}")]
    Timeout(Duration),
    #[error("not connected to a server")]
    NotConnected,
    #[error(transparent)]
    Name(#[from] NameEncodingError),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("unreadable server response: {0}")]
    Decode(#[from] DecodeError),
}

pub struct Client<S = TcpStream> {
    stream: Option<BufReader<S>>,
    read_timeout: Duration,
}

impl Client<TcpStream> {
    /// Connects and announces `name`, encoded the way the target port expects
    pub async fn connect(host: &str, port: u16, name: &str) -> Result<Self, ClientError> {
        let addr = format!("{}:{}", host, port);
        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|source| ClientError::Connect {
                addr: addr.clone(),
                source,
            })?;
        info!("Connected to {}", addr);

        let mut client = Client::new(stream);
        client.handshake(name, NameEncoding::for_port(port)).await?;
        Ok(client)
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream: Some(BufReader::new(stream)),
            read_timeout: READ_TIMEOUT,
        }
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn stream(&mut self) -> Result<&mut BufReader<S>, ClientError> {
        self.stream.as_mut().ok_or(ClientError::NotConnected)
    }

    async fn write_line(&mut self, line: &[u8]) -> Result<(), ClientError> {
        let stream = self.stream()?;
        stream.write_all(line).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Next trimmed line, or `None` once the server has hung up
    async fn read_line(&mut self) -> Result<Option<String>, ClientError> {
        let deadline = self.read_timeout;
        let stream = self.stream()?;
        let mut buf = Vec::new();

        let read = timeout(deadline, stream.read_until(b'\n', &mut buf))
            .await
            .map_err(|_| ClientError::Timeout(deadline))?;

        match read {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(String::from_utf8_lossy(&buf).trim().to_string())),
            Err(e) if e.kind() == io::ErrorKind::ConnectionReset => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_response(&mut self) -> Result<Response, ClientError> {
        match self.read_line().await? {
            None => Ok(Response::game_over()),
            Some(line) if line == GAME_OVER => Ok(Response::game_over()),
            Some(line) => Ok(line.parse()?),
        }
    }

    /// Sends the player name as the first line
    pub async fn handshake(
        &mut self,
        name: &str,
        encoding: NameEncoding,
    ) -> Result<(), ClientError> {
        let mut line = encoding.encode(name)?;
        line.push(b'\n');
        self.write_line(&line).await
    }

    /// Waits for the server's prompt and returns the neighbourhood response
    pub async fn ready(&mut self) -> Result<Response, ClientError> {
        let prompt = match self.read_line().await? {
            None => return Ok(Response::game_over()),
            Some(prompt) if prompt == GAME_OVER => return Ok(Response::game_over()),
            Some(prompt) => prompt,
        };
        if prompt != READY_PROMPT {
            debug!("Unexpected prompt {:?}, answering anyway", prompt);
        }

        self.write_line(format!("{}\r\n", READY_ACK).as_bytes()).await?;
        self.read_response().await
    }

    /// Sends one action and returns its response
    pub async fn act(&mut self, action: Action) -> Result<Response, ClientError> {
        debug!("Sending {}", action);
        self.write_line(action.to_line().as_bytes()).await?;

        let response = self.read_response().await?;
        if !response.is_game_over() {
            self.write_line(format!("{}\r\n", ACTION_ACK).as_bytes()).await?;
        }
        Ok(response)
    }

    pub async fn walk(&mut self, dir: Direction) -> Result<Response, ClientError> {
        self.act(Action::Walk(dir)).await
    }

    pub async fn look(&mut self, dir: Direction) -> Result<Response, ClientError> {
        self.act(Action::Look(dir)).await
    }

    pub async fn search(&mut self, dir: Direction) -> Result<Response, ClientError> {
        self.act(Action::Search(dir)).await
    }

    pub async fn put(&mut self, dir: Direction) -> Result<Response, ClientError> {
        self.act(Action::Put(dir)).await
    }

    /// Closes the connection. Calling it again does nothing.
    pub async fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!("Shutdown failed: {}", e);
            }
        }
    }
}
