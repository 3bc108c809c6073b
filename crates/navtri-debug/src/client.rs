//! Blocking client for the debug protocol

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use thiserror::Error;

use crate::protocol::{DebugCommand, DebugResponse, ResponseData};

/// Failure talking to a debug server
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("connection closed by server")]
    Closed,

    #[error("server error: {0}")]
    Remote(String),
}

/// One connection to a debug server, one request in flight at a time
pub struct DebugClient {
    writer: TcpStream,
    reader: BufReader<TcpStream>,
}

impl DebugClient {
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self, ProtocolError> {
        let stream = TcpStream::connect(addr)?;
        stream.set_read_timeout(Some(Duration::from_secs(30)))?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self { writer: stream, reader })
    }

    /// Send a command and wait for its response line
    pub fn send(&mut self, cmd: &DebugCommand) -> Result<ResponseData, ProtocolError> {
        let mut json = serde_json::to_string(cmd)?;
        json.push('\n');
        self.writer.write_all(json.as_bytes())?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(ProtocolError::Closed);
        }
        match serde_json::from_str::<DebugResponse>(line.trim())? {
            DebugResponse::Ok { data } => Ok(data),
            DebugResponse::Error { message } => Err(ProtocolError::Remote(message)),
        }
    }
}
