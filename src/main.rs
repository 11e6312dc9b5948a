use std::sync::Arc;

use tokio::signal;
use tokio::task::JoinSet;

use rawhttp::addr::server_addr;
use rawhttp::client::fetch;
use rawhttp::{Logger, Server, ServerConfig};

const DEMO_CLIENTS: usize = 5;

#[tokio::main]
async fn main() {
    let logger = Arc::new(Logger::stdout());

    match std::env::args().nth(1).as_deref() {
        None | Some("server") => run_server(logger, 0).await,
        Some("demo") => run_server(logger, DEMO_CLIENTS).await,
        Some("client") => {
            if let Err(e) = fetch(server_addr().await, "/", &logger).await {
                eprintln!("Client failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(other) => {
            eprintln!("Unknown mode {:?}; expected server, client or demo", other);
            std::process::exit(2);
        }
    }
}

async fn run_server(logger: Arc<Logger>, clients: usize) {
    let addr = server_addr().await;
    let server = match Server::bind(ServerConfig::new(addr), Arc::clone(&logger)).await {
        Ok(server) => server,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if clients > 0 {
        let addr = match server.local_addr() {
            Ok(addr) => addr,
            Err(e) => {
                eprintln!("Failed to read bound address: {}", e);
                std::process::exit(1);
            }
        };
        let logger = Arc::clone(&logger);
        tokio::spawn(async move {
            let mut set = JoinSet::new();
            for _ in 0..clients {
                let logger = Arc::clone(&logger);
                set.spawn(async move {
                    if let Err(e) = fetch(addr, "/", &logger).await {
                        logger.log(format!("[CLIENT] Request failed: {}", e));
                    }
                });
            }
            while set.join_next().await.is_some() {}
        });
    }

    server.run_until(shutdown_signal()).await;
    logger.log("[SERVER] Server shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
