// src/core/scanner/services/ftp.rs

use crate::core::models::FtpResults;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use super::connect;

pub async fn enumerate_ftp(target: &str, port: u16, timeout: Duration) -> FtpResults {
    info!(target, port, "Starting FTP enumeration.");
    let mut results = FtpResults { port, ..Default::default() };

    match connect(target, port, timeout).await {
        Ok(stream) => match tokio::time::timeout(timeout, read_banner(stream)).await {
            Ok(Ok(banner)) => results.banner = Some(banner),
            Ok(Err(e)) => results.error = Some(format!("Banner grab failed: {}", e)),
            Err(_) => results.error = Some("Banner grab timed out".to_string()),
        },
        Err(e) => {
            results.error = Some(e);
            return results;
        }
    }

    results.anonymous_login = match connect(target, port, timeout).await {
        Ok(stream) => matches!(
            tokio::time::timeout(timeout * 3, anonymous_login(stream)).await,
            Ok(Ok(true))
        ),
        Err(e) => {
            debug!(error = %e, "Anonymous login connection failed.");
            false
        }
    };

    info!(anonymous = results.anonymous_login, "FTP enumeration finished.");
    results
}

/// Reads one complete FTP reply, following `123-` continuation lines until `123 `.
async fn read_reply<R: AsyncBufReadExt + Unpin>(reader: &mut R) -> io::Result<(u16, String)> {
    let mut text = String::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed"));
        }
        text.push_str(&line);
        let bytes = line.as_bytes();
        if bytes.len() >= 4 && bytes[..3].iter().all(u8::is_ascii_digit) && bytes[3] == b' ' {
            let code = line[..3].parse().unwrap_or(0);
            return Ok((code, text.trim_end().to_string()));
        }
    }
}

pub async fn read_banner<S: AsyncRead + Unpin>(stream: S) -> io::Result<String> {
    let mut reader = BufReader::new(stream);
    let (_, text) = read_reply(&mut reader).await?;
    Ok(text)
}

/// Attempts `anonymous` / `anonymous@`; true when the server answers 230.
pub async fn anonymous_login<S: AsyncRead + AsyncWrite + Unpin>(stream: S) -> io::Result<bool> {
    let mut stream = BufReader::new(stream);
    read_reply(&mut stream).await?;

    stream.get_mut().write_all(b"USER anonymous\r\n").await?;
    let (mut code, _) = read_reply(&mut stream).await?;
    if code == 331 {
        stream.get_mut().write_all(b"PASS anonymous@\r\n").await?;
        code = read_reply(&mut stream).await?.0;
    }
    let _ = stream.get_mut().write_all(b"QUIT\r\n").await;
    debug!(code, "Anonymous login reply.");
    Ok(code == 230)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt};

    async fn fake_server(mut server: tokio::io::DuplexStream, accept_anonymous: bool) {
        server
            .write_all(b"220-Welcome\r\n220 (vsFTPd 3.0.3)\r\n")
            .await
            .unwrap();
        let mut buf = [0u8; 64];
        let n = server.read(&mut buf).await.unwrap();
        assert!(buf[..n].starts_with(b"USER anonymous"));
        server.write_all(b"331 Please specify the password.\r\n").await.unwrap();
        let n = server.read(&mut buf).await.unwrap();
        assert!(buf[..n].starts_with(b"PASS anonymous@"));
        let reply: &[u8] = if accept_anonymous { b"230 Login successful.\r\n" } else { b"530 Login incorrect.\r\n" };
        server.write_all(reply).await.unwrap();
    }

    #[tokio::test]
    async fn multi_line_banner_is_read_whole() {
        let (client, mut server) = duplex(256);
        server.write_all(b"220-Welcome\r\n220 (vsFTPd 3.0.3)\r\n").await.unwrap();
        let banner = read_banner(client).await.unwrap();
        assert_eq!(banner, "220-Welcome\r\n220 (vsFTPd 3.0.3)");
    }

    #[tokio::test]
    async fn anonymous_login_succeeds_on_230() {
        let (client, server) = duplex(256);
        let server = tokio::spawn(fake_server(server, true));
        assert!(anonymous_login(client).await.unwrap());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn anonymous_login_fails_on_530() {
        let (client, server) = duplex(256);
        let server = tokio::spawn(fake_server(server, false));
        assert!(!anonymous_login(client).await.unwrap());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn closed_connection_is_an_error() {
        let (client, server) = duplex(64);
        drop(server);
        assert!(read_banner(client).await.is_err());
    }
}
