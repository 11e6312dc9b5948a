use parking_lot::Mutex;
use rawhttp::*;
use std::fs;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinSet;

// Write sink that keeps everything for later inspection
#[derive(Clone, Default)]
struct CaptureBuffer(Arc<Mutex<Vec<u8>>>);

impl CaptureBuffer {
    fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Write for CaptureBuffer {
    // Deliberately dribble bytes out one at a time so an unlocked writer would interleave
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match buf.first() {
            Some(byte) => {
                self.0.lock().push(*byte);
                std::thread::yield_now();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod logger_tests {
    use super::*;

    #[test]
    fn test_lines_do_not_interleave_across_threads() {
        let capture = CaptureBuffer::default();
        let logger = Arc::new(Logger::new(capture.clone()));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let logger = Arc::clone(&logger);
                std::thread::spawn(move || {
                    let marker = char::from(b'a' + t as u8);
                    for _ in 0..50 {
                        logger.log(marker.to_string().repeat(64));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let lines = capture.lines();
        assert_eq!(lines.len(), 8 * 50);
        for line in &lines {
            assert_eq!(line.len(), 64, "torn line: {:?}", line);
            let first = line.chars().next().unwrap();
            assert!(line.chars().all(|c| c == first), "interleaved line: {:?}", line);
        }
    }

    #[test]
    fn test_plain_logger_has_no_prefix() {
        let capture = CaptureBuffer::default();
        let logger = Logger::new(capture.clone());
        logger.log("[SERVER] hello");
        assert_eq!(capture.lines(), vec!["[SERVER] hello".to_string()]);
    }

    #[test]
    fn test_timestamp_prefix() {
        let capture = CaptureBuffer::default();
        let logger = Logger::new(capture.clone()).with_timestamps();
        logger.log("[CLIENT] hi");

        let lines = capture.lines();
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert!(line.starts_with('['));
        assert!(line.ends_with("GMT] [CLIENT] hi"), "{}", line);
    }

    #[test]
    fn test_single_line_escapes_breaks() {
        assert_eq!(
            rawhttp::logger::single_line("GET / HTTP/1.1\r\n\r\n"),
            "GET / HTTP/1.1\\r\\n\\r\\n"
        );
    }
}

#[cfg(test)]
mod server_logging_tests {
    use super::*;

    const NUM_CLIENTS: usize = 15;

    const TEMPLATES: &[&str] = &[
        "[SERVER] Address: ",
        "[SERVER] Bound to: ",
        "[SERVER] Begun listening for incoming connections. Backlog set to 10",
        "[SERVER] Currently handling: ",
        "[SERVER] Received from 127.0.0.1:",
        "[SERVER] Got GET request, trying to open ",
        "[SERVER] Connection 127.0.0.1:",
    ];

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_connections_log_whole_lines() {
        let site = TempDir::new().unwrap();
        fs::write(site.path().join("index.html"), "hello").unwrap();

        let capture = CaptureBuffer::default();
        let config = ServerConfig::new("127.0.0.1:0".parse().unwrap())
            .with_public_root(site.path());
        let server = Server::bind(config, Arc::new(Logger::new(capture.clone())))
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        let stats = server.stats();
        tokio::spawn(server.run());

        let mut set = JoinSet::new();
        for _ in 0..NUM_CLIENTS {
            set.spawn(async move {
                let mut stream = TcpStream::connect(addr).await.unwrap();
                stream.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();
                stream.shutdown().await.unwrap();
                let mut response = Vec::new();
                stream.read_to_end(&mut response).await.unwrap();
                response
            });
        }
        while let Some(response) = set.join_next().await {
            assert_eq!(response.unwrap(), b"HTTP/1.1 200 OK\r\n\r\nhello".to_vec());
        }

        for _ in 0..100 {
            if stats.active() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        let lines = capture.lines();
        for line in &lines {
            assert!(
                TEMPLATES.iter().any(|t| line.starts_with(t)),
                "line matches no template: {:?}",
                line
            );
        }

        let received: Vec<_> = lines
            .iter()
            .filter(|l| l.starts_with("[SERVER] Received from "))
            .collect();
        assert_eq!(received.len(), NUM_CLIENTS);
        for line in received {
            assert!(line.ends_with(": GET / HTTP/1.1\\r\\n\\r\\n"), "{:?}", line);
        }

        let closed = lines
            .iter()
            .filter(|l| l.starts_with("[SERVER] Connection ") && l.ends_with("closed by peer"))
            .count();
        assert_eq!(closed, NUM_CLIENTS);
    }

    #[tokio::test]
    async fn test_idle_close_is_logged_once() {
        let site = TempDir::new().unwrap();
        let capture = CaptureBuffer::default();
        let config = ServerConfig::new("127.0.0.1:0".parse().unwrap())
            .with_public_root(site.path())
            .with_idle_timeout(Duration::from_millis(200));
        let server = Server::bind(config, Arc::new(Logger::new(capture.clone())))
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        let stats = server.stats();
        tokio::spawn(server.run());

        let mut stream = TcpStream::connect(addr).await.unwrap();
        let port = stream.local_addr().unwrap().port();
        let mut rest = Vec::new();
        tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut rest))
            .await
            .expect("idle connection was never closed")
            .unwrap();
        assert!(rest.is_empty());

        for _ in 0..100 {
            if stats.active() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        let expected = format!("[SERVER] Connection 127.0.0.1:{} idle for 0.2s, closing", port);
        let idle: Vec<_> = capture
            .lines()
            .into_iter()
            .filter(|l| l.starts_with("[SERVER] Connection "))
            .collect();
        assert_eq!(idle, vec![expected]);
    }
}
