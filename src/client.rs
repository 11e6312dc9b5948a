use std::io;
use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::config::READ_CHUNK_SIZE;
use crate::logger::{single_line, Logger};

pub fn get_request(target: &str) -> String {
    format!("GET {} HTTP/1.1\r\n\r\n", target)
}

// One GET, one chunk of response, logged
pub async fn fetch(addr: SocketAddr, target: &str, logger: &Logger) -> io::Result<String> {
    logger.log(format!("[CLIENT] Attempting to connect to: {}", addr));
    let mut stream = TcpStream::connect(addr).await?;

    let request = get_request(target);
    logger.log(format!("[CLIENT] Sending: {}", single_line(&request)));
    stream.write_all(request.as_bytes()).await?;

    let mut buffer = [0u8; READ_CHUNK_SIZE];
    let read = stream.read(&mut buffer).await?;
    let response = String::from_utf8_lossy(&buffer[..read]).into_owned();

    logger.log(format!("[CLIENT] Received: {}", single_line(&response)));
    Ok(response)
}
