use std::error::Error;
use std::fmt;

pub const HTTP_VERSION: &str = "HTTP/1.1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request<'a> {
    pub method: &'a str,
    pub target: &'a str,
    pub version: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    MissingTokens(usize),
    UnsupportedVersion(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingTokens(found) => {
                write!(f, "request line has {} of 3 required tokens", found)
            }
            ParseError::UnsupportedVersion(version) => {
                write!(f, "unsupported protocol version {:?}", version)
            }
        }
    }
}

impl Error for ParseError {}

impl<'a> Request<'a> {
    // Only the first line counts; tokens past the third are ignored
    pub fn parse(data: &'a str) -> Result<Self, ParseError> {
        let line = data.lines().next().unwrap_or("");
        let mut tokens = line.split_whitespace();

        let (method, target, version) = match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(m), Some(t), Some(v)) => (m, t, v),
            (m, t, _) => {
                let found = usize::from(m.is_some()) + usize::from(t.is_some());
                return Err(ParseError::MissingTokens(found));
            }
        };

        if version != HTTP_VERSION {
            return Err(ParseError::UnsupportedVersion(version.to_string()));
        }

        Ok(Self {
            method,
            target,
            version,
        })
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }
}
