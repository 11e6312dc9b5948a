use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;
pub const SERVER_BACKLOG: u32 = 10;
pub const IDLE_TIMEOUT_SECS: u64 = 30;
pub const READ_CHUNK_SIZE: usize = 512;
pub const PUBLIC_ROOT: &str = "www";
pub const ROOT_DOCUMENT: &str = "index.html";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub backlog: u32,
    pub idle_timeout: Duration,
    pub read_chunk_size: usize,
    pub public_root: PathBuf,
}

impl ServerConfig {
    // Every limit at its default; callers pick the address
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            backlog: SERVER_BACKLOG,
            idle_timeout: Duration::from_secs(IDLE_TIMEOUT_SECS),
            read_chunk_size: READ_CHUNK_SIZE,
            public_root: PathBuf::from(PUBLIC_ROOT),
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn with_public_root(mut self, public_root: impl Into<PathBuf>) -> Self {
        self.public_root = public_root.into();
        self
    }
}
