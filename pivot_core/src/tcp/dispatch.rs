use std::io::{Error, ErrorKind, Result};

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use super::socket;
use super::session::{RelaySession, SessionEnd};

use crate::dns::resolve_addr;
use crate::directive::parse;
use crate::endpoint::ConnectOpts;
use crate::error::DispatchError;
use crate::registry::{Registry, SessionId};
use crate::time::timeoutfut;

/// Read the directive line, up to and including the first `\n`.
///
/// Returns the line without its terminator, whatever the client sent
/// after it that was already buffered, and the connection itself.
async fn read_directive(local: TcpStream, max_len: usize) -> Result<(Vec<u8>, Vec<u8>, TcpStream)> {
    let limit = match max_len {
        0 => u64::MAX,
        n => n as u64,
    };

    let mut reader = BufReader::new(local);
    let mut line = Vec::new();
    (&mut reader).take(limit).read_until(b'\n', &mut line).await?;

    if line.last() != Some(&b'\n') {
        return Err(if line.len() as u64 >= limit {
            Error::new(ErrorKind::InvalidData, "directive too long")
        } else {
            Error::new(ErrorKind::UnexpectedEof, "connection closed before directive")
        });
    }
    line.pop();

    let pending = reader.buffer().to_vec();
    Ok((line, pending, reader.into_inner()))
}

/// Serve one accepted connection: work out the next hop, connect to it,
/// forward what belongs to it, then start a session in the background.
///
/// With a `seed`, nothing is read from `local` before relaying. Any error
/// drops `local`, closing it without writing anything to the client.
pub async fn dispatch(
    local: TcpStream,
    seed: Option<&str>,
    conn_opts: &ConnectOpts,
    registry: &Registry,
) -> std::result::Result<SessionId, DispatchError> {
    let peer = local.peer_addr()?;

    let (line, pending, local) = match seed {
        Some(seed) => (seed.as_bytes().to_vec(), Vec::new(), local),
        None => timeoutfut(
            read_directive(local, conn_opts.max_directive_len),
            conn_opts.directive_timeout,
        )
        .await
        .and_then(|x| x)
        .map_err(DispatchError::Directive)?,
    };

    let directive = parse(&line)?;
    let raddr = directive.remote_addr()?;
    let hop = directive.to_string();

    let candidates = resolve_addr(&raddr)
        .await
        .map_err(|e| DispatchError::Resolve(hop.clone(), e))?;
    log::debug!("[tcp]{} resolved as {:?}", &raddr, &candidates);

    let mut remote = socket::connect(&raddr, &candidates, conn_opts)
        .await
        .map_err(|e| DispatchError::Connect(hop.clone(), e))?;
    let remote_addr = remote.peer_addr()?;

    // the rest of the chain, then anything the client pipelined
    let mut head = directive.forward_line().unwrap_or_default();
    head.extend_from_slice(&pending);
    if !head.is_empty() {
        remote.write_all(&head).await?;
    }

    let guard = registry.register(peer, hop, remote_addr);
    let session = RelaySession::new(local, remote, guard);
    let id = session.id();

    log::info!("[tcp]#{} {} => {} as {}", id, peer, directive, remote_addr);

    tokio::spawn(async move {
        let end = session.start().await;
        log::info!("[tcp]#{} {} finish, {}", id, peer, &end);
        if let SessionEnd::Finished { upload, download } = &end {
            for report in [upload, download] {
                if let Some(e) = &report.error {
                    log::debug!("[tcp]#{} forward error: {}", id, e);
                }
            }
        }
    });

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn pair() -> (TcpStream, TcpStream) {
        let lis = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = lis.local_addr().unwrap();
        let (client, accepted) = tokio::join!(TcpStream::connect(addr), lis.accept());
        (client.unwrap(), accepted.unwrap().0)
    }

    #[tokio::test]
    async fn keeps_pipelined_bytes() {
        let (mut client, server) = pair().await;
        client.write_all(b"h:1 rest\r\nearly bytes").await.unwrap();

        // give both writes a chance to land in one read
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let (line, pending, _) = read_directive(server, 4096).await.unwrap();
        assert_eq!(line, b"h:1 rest\r");
        assert_eq!(pending, b"early bytes");
    }

    #[tokio::test]
    async fn rejects_long_line() {
        let (mut client, server) = pair().await;
        client.write_all(&[b'a'; 64]).await.unwrap();

        let err = read_directive(server, 16).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn rejects_eof_before_newline() {
        let (mut client, server) = pair().await;
        client.write_all(b"h:1").await.unwrap();
        client.shutdown().await.unwrap();

        let err = read_directive(server, 4096).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }
}
