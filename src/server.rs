use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpSocket};

use crate::config::ServerConfig;
use crate::handler::{handle_connection, ServerContext};
use crate::logger::Logger;
use crate::stats::{ActiveGuard, ConnectionStats};

pub struct Server {
    listener: TcpListener,
    ctx: Arc<ServerContext>,
}

impl Server {
    pub async fn bind(config: ServerConfig, logger: Arc<Logger>) -> io::Result<Self> {
        let addr = config.addr;
        logger.log(format!("[SERVER] Address: {}", addr));

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        // Allow rapid restarting of the server
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;

        let listener = socket.listen(config.backlog)?;
        let bound = listener.local_addr()?;
        logger.log(format!("[SERVER] Bound to: {}", bound));
        logger.log(format!(
            "[SERVER] Begun listening for incoming connections. Backlog set to {}",
            config.backlog
        ));

        Ok(Self {
            listener,
            ctx: Arc::new(ServerContext::new(config, logger)),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn stats(&self) -> Arc<ConnectionStats> {
        Arc::clone(&self.ctx.stats)
    }

    pub async fn run(self) {
        self.run_until(std::future::pending::<()>()).await
    }

    // Handlers already running are left to finish
    pub async fn run_until<F: Future>(self, shutdown: F) {
        tokio::pin!(shutdown);
        let logger = Arc::clone(&self.ctx.logger);

        loop {
            logger.log(format!(
                "[SERVER] Currently handling: {} active connections",
                self.ctx.stats.active()
            ));

            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            let guard = ActiveGuard::new(Arc::clone(&self.ctx.stats));
                            let ctx = Arc::clone(&self.ctx);
                            tokio::spawn(async move {
                                let _guard = guard;
                                handle_connection(stream, peer, ctx).await;
                            });
                        }
                        Err(e) => {
                            logger.log(format!("[SERVER] Failed to accept connection: {}", e));
                        }
                    }
                }
                _ = &mut shutdown => {
                    logger.log("[SERVER] Shutdown signal received, stopping server");
                    break;
                }
            }
        }
    }
}

pub async fn start(config: ServerConfig, logger: Arc<Logger>) -> io::Result<()> {
    Server::bind(config, logger).await?.run().await;
    Ok(())
}
