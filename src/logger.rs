use std::io::{self, Write};
use std::time::SystemTime;

use parking_lot::Mutex;

pub struct Logger {
    sink: Mutex<Box<dyn Write + Send>>,
    timestamps: bool,
}

impl Logger {
    pub fn new<W: Write + Send + 'static>(sink: W) -> Self {
        Self {
            sink: Mutex::new(Box::new(sink)),
            timestamps: false,
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout()).with_timestamps()
    }

    pub fn with_timestamps(mut self) -> Self {
        self.timestamps = true;
        self
    }

    pub fn log(&self, line: impl AsRef<str>) {
        let line = line.as_ref();
        let mut formatted = String::with_capacity(line.len() + 32);
        if self.timestamps {
            formatted.push('[');
            formatted.push_str(&httpdate::fmt_http_date(SystemTime::now()));
            formatted.push_str("] ");
        }
        formatted.push_str(line);
        formatted.push('\n');

        // One write per line under the lock so concurrent lines never interleave
        let mut sink = self.sink.lock();
        // Nowhere left to report a failing log sink
        let _ = sink.write_all(formatted.as_bytes());
        let _ = sink.flush();
    }
}

// Keeps raw request bytes on a single log line
pub fn single_line(data: &str) -> String {
    data.escape_debug().to_string()
}
