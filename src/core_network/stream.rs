//! Plain or TLS-wrapped TCP stream, used for both control and data connections.

use std::io::Result;
use std::pin::Pin;
use std::task::{Context, Poll};

use pin_project::pin_project;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::server::TlsStream;

#[pin_project(project = FtpStreamProj)]
pub enum FtpStream {
    Plain(#[pin] TcpStream),
    Secure(#[pin] Box<TlsStream<TcpStream>>),
}

impl AsyncRead for FtpStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<Result<()>> {
        match self.project() {
            FtpStreamProj::Plain(stream) => stream.poll_read(cx, buf),
            FtpStreamProj::Secure(stream) => stream.poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for FtpStream {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<Result<usize>> {
        match self.project() {
            FtpStreamProj::Plain(stream) => stream.poll_write(cx, buf),
            FtpStreamProj::Secure(stream) => stream.poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
        match self.project() {
            FtpStreamProj::Plain(stream) => stream.poll_flush(cx),
            FtpStreamProj::Secure(stream) => stream.poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
        match self.project() {
            FtpStreamProj::Plain(stream) => stream.poll_shutdown(cx),
            FtpStreamProj::Secure(stream) => stream.poll_shutdown(cx),
        }
    }
}
