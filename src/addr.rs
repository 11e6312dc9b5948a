use std::net::{Ipv4Addr, SocketAddr};

use once_cell::sync::OnceCell;
use tokio::net::lookup_host;

use crate::config::DEFAULT_PORT;

// Resolved once from the machine hostname, shared by server and client
static SERVER_ADDR: OnceCell<SocketAddr> = OnceCell::new();

fn loopback() -> SocketAddr {
    SocketAddr::new(Ipv4Addr::LOCALHOST.into(), DEFAULT_PORT)
}

async fn lookup() -> SocketAddr {
    let hostname = match nix::unistd::gethostname() {
        Ok(name) => name,
        Err(_) => return loopback(),
    };
    let Some(hostname) = hostname.to_str() else {
        return loopback();
    };

    let addr = match lookup_host((hostname, DEFAULT_PORT)).await {
        Ok(mut addrs) => addrs.find(|addr| addr.is_ipv4()).unwrap_or_else(loopback),
        Err(_) => loopback(),
    };
    addr
}

// First IPv4 address of this machine's hostname on the default port, or loopback
pub async fn server_addr() -> SocketAddr {
    if let Some(addr) = SERVER_ADDR.get() {
        return *addr;
    }
    let resolved = lookup().await;
    *SERVER_ADDR.get_or_init(|| resolved)
}
