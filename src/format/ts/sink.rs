//! Byte sinks a transport stream can be written to.

use super::types::TS_PACKET_SIZE;
use crate::error::{Result, StreamerError};
use bytes::BytesMut;
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::net::{TcpStream, UdpSocket};
use url::Url;

/// Seven transport packets per datagram keeps UDP payloads under a 1500 MTU.
pub const UDP_DATAGRAM_SIZE: usize = 7 * TS_PACKET_SIZE;

/// Where the bytes of a session end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    File(PathBuf),
    Udp(String),
    Tcp(String),
}

impl Destination {
    /// Interprets `destination` as a URL when it has a known scheme, and as a
    /// file path otherwise.
    pub fn parse(destination: &str) -> Result<Self> {
        if destination.is_empty() {
            return Err(StreamerError::InvalidData("empty destination".into()));
        }

        let url = match Url::parse(destination) {
            Ok(url) => url,
            Err(_) => return Ok(Destination::File(PathBuf::from(destination))),
        };

        match url.scheme() {
            "file" => url
                .to_file_path()
                .map(Destination::File)
                .map_err(|_| StreamerError::InvalidData(format!("invalid file URL: {destination}"))),
            "udp" => Ok(Destination::Udp(socket_address(&url)?)),
            "tcp" => Ok(Destination::Tcp(socket_address(&url)?)),
            // Windows drive letters parse as one-letter schemes
            scheme if scheme.len() == 1 => Ok(Destination::File(PathBuf::from(destination))),
            scheme => Err(StreamerError::Format(format!("unsupported protocol: {scheme}"))),
        }
    }
}

fn socket_address(url: &Url) -> Result<String> {
    let host = url
        .host_str()
        .ok_or_else(|| StreamerError::InvalidData(format!("missing host in {url}")))?;
    let port = url
        .port()
        .ok_or_else(|| StreamerError::InvalidData(format!("missing port in {url}")))?;
    Ok(format!("{host}:{port}"))
}

/// An open output. Writes are buffered; `flush` pushes them out.
#[derive(Debug)]
pub enum Sink {
    File(BufWriter<File>),
    Udp { socket: UdpSocket, pending: BytesMut },
    Tcp(BufWriter<TcpStream>),
}

impl Sink {
    pub async fn open(destination: &Destination) -> Result<Self> {
        match destination {
            Destination::File(path) => {
                let file = File::create(path).await?;
                Ok(Sink::File(BufWriter::new(file)))
            }
            Destination::Udp(addr) => {
                let target = tokio::net::lookup_host(addr.as_str())
                    .await?
                    .next()
                    .ok_or_else(|| StreamerError::InvalidData(format!("cannot resolve {addr}")))?;
                let bind = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
                let socket = UdpSocket::bind(bind).await?;
                socket.connect(target).await?;
                Ok(Sink::Udp {
                    socket,
                    pending: BytesMut::with_capacity(UDP_DATAGRAM_SIZE),
                })
            }
            Destination::Tcp(addr) => {
                let stream = TcpStream::connect(addr.as_str()).await?;
                stream.set_nodelay(true)?;
                Ok(Sink::Tcp(BufWriter::new(stream)))
            }
        }
    }

    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Sink::File(writer) => writer.write_all(data).await?,
            Sink::Tcp(writer) => writer.write_all(data).await?,
            Sink::Udp { socket, pending } => {
                pending.extend_from_slice(data);
                while pending.len() >= UDP_DATAGRAM_SIZE {
                    let datagram = pending.split_to(UDP_DATAGRAM_SIZE);
                    socket.send(&datagram).await?;
                }
            }
        }
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<()> {
        match self {
            Sink::File(writer) => writer.flush().await?,
            Sink::Tcp(writer) => writer.flush().await?,
            Sink::Udp { socket, pending } => {
                if !pending.is_empty() {
                    let datagram = pending.split();
                    socket.send(&datagram).await?;
                }
            }
        }
        Ok(())
    }

    /// Flushes and releases the underlying handle.
    pub async fn close(mut self) -> Result<()> {
        self.flush().await?;
        match self {
            Sink::File(writer) => writer.into_inner().sync_all().await?,
            Sink::Tcp(mut writer) => writer.shutdown().await?,
            Sink::Udp { .. } => {}
        }
        Ok(())
    }
}
