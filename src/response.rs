use crate::request::HTTP_VERSION;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    NotFound,
    InternalServerError,
    HttpVersionNotSupported,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::NotFound => 404,
            Status::InternalServerError => 500,
            Status::HttpVersionNotSupported => 505,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::NotFound => "Not Found",
            Status::InternalServerError => "Internal Server Error",
            Status::HttpVersionNotSupported => "HTTP Version not supported",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: Status, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn empty(status: Status) -> Self {
        Self::new(status, Vec::new())
    }

    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(Status::Ok, body)
    }

    pub fn version_not_supported() -> Self {
        Self::new(
            Status::HttpVersionNotSupported,
            "Server only accepts HTTP/1.1. Please try again",
        )
    }

    pub fn status_line(&self) -> String {
        format!(
            "{} {} {}",
            HTTP_VERSION,
            self.status.code(),
            self.status.reason()
        )
    }

    // Every status is framed the same way: status line, blank line, body
    pub fn to_bytes(&self) -> Vec<u8> {
        let status_line = self.status_line();
        let mut bytes = Vec::with_capacity(status_line.len() + 4 + self.body.len());
        bytes.extend_from_slice(status_line.as_bytes());
        bytes.extend_from_slice(b"\r\n\r\n");
        bytes.extend_from_slice(&self.body);
        bytes
    }
}
