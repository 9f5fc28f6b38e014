use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use crate::host::NetAddress;

pub trait Connection: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Connection for T {}

pub trait Dialer: Send + Sync {
    type Conn: Connection;

    fn dial(
        &self,
        addr: &NetAddress,
        timeout: Duration,
    ) -> impl Future<Output = io::Result<Self::Conn>> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TcpDialer;

impl Dialer for TcpDialer {
    type Conn = TcpStream;

    async fn dial(&self, addr: &NetAddress, timeout: Duration) -> io::Result<TcpStream> {
        tokio::time::timeout(timeout, TcpStream::connect(addr.0.as_str()))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "dial timed out"))?
    }
}
