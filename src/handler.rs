use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{timeout_at, Instant};

use crate::config::ServerConfig;
use crate::logger::{single_line, Logger};
use crate::request::{ParseError, Request};
use crate::resources::{ResourceError, StaticFiles};
use crate::response::{Response, Status};
use crate::stats::ConnectionStats;

pub const FAVICON_PATH: &str = "/favicon.ico";

// Shared by every handler spawned from one listener
pub struct ServerContext {
    pub config: ServerConfig,
    pub files: StaticFiles,
    pub logger: Arc<Logger>,
    pub stats: Arc<ConnectionStats>,
}

impl ServerContext {
    pub fn new(config: ServerConfig, logger: Arc<Logger>) -> Self {
        Self {
            files: StaticFiles::new(config.public_root.clone()),
            config,
            logger,
            stats: Arc::new(ConnectionStats::new()),
        }
    }
}

#[derive(Debug)]
pub enum CloseReason {
    IdleTimeout,
    PeerClosed,
    Protocol(ParseError),
    Io(io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deadline {
    Extend,
    Keep,
}

pub async fn handle_connection(mut stream: TcpStream, peer: SocketAddr, ctx: Arc<ServerContext>) {
    let reason = serve(&mut stream, peer, &ctx).await;

    match reason {
        CloseReason::IdleTimeout => ctx.logger.log(format!(
            "[SERVER] Connection {} idle for {}s, closing",
            peer,
            ctx.config.idle_timeout.as_secs_f64()
        )),
        CloseReason::PeerClosed => {
            ctx.logger.log(format!("[SERVER] Connection {} closed by peer", peer))
        }
        CloseReason::Protocol(e) => ctx.logger.log(format!(
            "[SERVER] Got a non HTTP/1.1 request from {} ({}). Informing and closing socket",
            peer, e
        )),
        CloseReason::Io(e) => {
            ctx.logger.log(format!("[SERVER] Connection {} failed: {}", peer, e))
        }
    }

    let _ = stream.shutdown().await;
}

// Reads, answers and repeats until the idle deadline passes or the peer breaks protocol.
// Only GET requests that reach the resolver push the deadline forward.
async fn serve(stream: &mut TcpStream, peer: SocketAddr, ctx: &ServerContext) -> CloseReason {
    let idle_timeout = ctx.config.idle_timeout;
    let mut deadline = Instant::now() + idle_timeout;
    let mut buffer = vec![0u8; ctx.config.read_chunk_size];

    loop {
        let read = match timeout_at(deadline, stream.read(&mut buffer)).await {
            Err(_) => return CloseReason::IdleTimeout,
            Ok(Ok(0)) => return CloseReason::PeerClosed,
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return CloseReason::Io(e),
        };

        let data = String::from_utf8_lossy(&buffer[..read]).into_owned();
        if data.trim().is_empty() {
            // Stray line breaks are idle noise, not requests
            continue;
        }

        ctx.logger.log(format!(
            "[SERVER] Received from {}:{}: {}",
            peer.ip(),
            peer.port(),
            single_line(&data)
        ));

        let request = match Request::parse(&data) {
            Ok(request) => request,
            Err(e) => {
                let response = Response::version_not_supported();
                if let Err(io_err) = send(stream, &response).await {
                    return CloseReason::Io(io_err);
                }
                ctx.stats.record_request();
                return CloseReason::Protocol(e);
            }
        };

        if let Some(tail) = header_tail(&buffer[..read], read == buffer.len()) {
            if let Err(reason) = drain_headers(stream, &mut buffer, tail, deadline).await {
                return reason;
            }
        }

        let (response, next) = respond(&request, ctx).await;
        if let Err(e) = send(stream, &response).await {
            return CloseReason::Io(e);
        }
        ctx.stats.record_request();

        if next == Deadline::Extend {
            deadline = Instant::now() + idle_timeout;
        }
    }
}

fn has_header_end(data: &[u8]) -> bool {
    data.windows(4).any(|w| w == b"\r\n\r\n") || data.windows(2).any(|w| w == b"\n\n")
}

// Trailing bytes to carry into the header scan, or None when the first chunk
// already holds the whole request. A bare request line that never reached a
// line break and did not fill the buffer counts as complete.
fn header_tail(first: &[u8], filled: bool) -> Option<Vec<u8>> {
    if has_header_end(first) {
        return None;
    }
    if !filled && !first.contains(&b'\n') {
        return None;
    }
    Some(first[first.len().saturating_sub(3)..].to_vec())
}

// Discards the rest of the header block so it is not read back as the next request line
async fn drain_headers(
    stream: &mut TcpStream,
    buffer: &mut [u8],
    mut tail: Vec<u8>,
    deadline: Instant,
) -> Result<(), CloseReason> {
    loop {
        let read = match timeout_at(deadline, stream.read(buffer)).await {
            Err(_) => return Err(CloseReason::IdleTimeout),
            // Half-closed mid-headers: answer what we have, the next read sees EOF
            Ok(Ok(0)) => return Ok(()),
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(CloseReason::Io(e)),
        };

        tail.extend_from_slice(&buffer[..read]);
        if has_header_end(&tail) {
            return Ok(());
        }
        let keep_from = tail.len().saturating_sub(3);
        tail.drain(..keep_from);
    }
}

async fn respond(request: &Request<'_>, ctx: &ServerContext) -> (Response, Deadline) {
    if !request.is_get() {
        // Non-GET does not reopen the idle window
        return (Response::empty(Status::InternalServerError), Deadline::Keep);
    }

    if request.target == FAVICON_PATH {
        return (Response::empty(Status::NotFound), Deadline::Keep);
    }

    let response = match ctx.files.resolve(request.target) {
        Ok(path) => {
            ctx.logger.log(format!(
                "[SERVER] Got GET request, trying to open {}",
                path.display()
            ));
            match ctx.files.load(path).await {
                Ok(contents) => Response::ok(contents),
                Err(e) => not_found(e, ctx),
            }
        }
        Err(e) => not_found(e, ctx),
    };

    (response, Deadline::Extend)
}

fn not_found(e: ResourceError, ctx: &ServerContext) -> Response {
    ctx.logger.log(format!("[SERVER] {}", e));
    Response::new(Status::NotFound, e.to_string())
}

async fn send(stream: &mut TcpStream, response: &Response) -> io::Result<()> {
    stream.write_all(&response.to_bytes()).await?;
    stream.flush().await
}
