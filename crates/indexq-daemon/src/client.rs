//! Minimal client for the query service

use indexq_core::{IndexqError, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use crate::protocol::{Method, Request, Response};

/// One connection; requests are answered in the order they are sent
pub struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    next_id: u64,
}

impl Client {
    pub async fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| IndexqError::Connection(format!("{}: {}", addr, e)))?;
        let (reader, writer) = stream.into_split();

        Ok(Self {
            reader: BufReader::new(reader),
            writer,
            next_id: 1,
        })
    }

    /// Send a request and wait for its response
    pub async fn send(&mut self, request: &Request) -> Result<Response> {
        let mut bytes = serde_json::to_vec(request)?;
        bytes.push(b'\n');
        self.writer.write_all(&bytes).await?;
        self.writer.flush().await?;

        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Err(IndexqError::Connection("service closed the connection".to_string()));
        }

        let response: Response = serde_json::from_str(&line)
            .map_err(|e| IndexqError::Protocol(format!("undecodable response: {}", e)))?;
        if response.id != request.id {
            return Err(IndexqError::Protocol(format!(
                "response id {} does not match request id {}",
                response.id, request.id
            )));
        }

        Ok(response)
    }

    /// Call `method` with string params, numbering requests automatically
    pub async fn call(&mut self, method: Method, params: &[(&str, &str)]) -> Result<Response> {
        let id = self.next_id.to_string();
        self.next_id += 1;

        let request = params
            .iter()
            .fold(Request::new(id, method), |request, (key, value)| request.param(key, *value));
        self.send(&request).await
    }
}
