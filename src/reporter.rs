use colored::Colorize;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::io::{self, Write};
use std::sync::Mutex;

use crate::probes::proxy::ProxyResult;

/// Clears from the cursor to the end of the line, wiping whatever
/// transient progress text is still showing there.
const CLEAR_LINE: &str = "\x1b[K";

/// Server signatures worth flagging: edge/CDN frontends that commonly
/// indicate zero-rated or misrouted paths.
static HIGH_VALUE_SERVERS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| HashSet::from(["AkamaiGHost", "Varnish", "AmazonS3"]));

/// Serializes all scan output through a single lock so concurrent workers
/// never interleave partial lines.
///
/// Two output kinds: transient "currently probing" lines that the next
/// write overwrites, and durable column-aligned result lines. Proxy
/// results get a multi-line block instead of a row.
pub struct Reporter {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl Reporter {
    pub fn stdout() -> Self {
        Self::with_sink(Box::new(io::stdout()))
    }

    pub fn with_sink(sink: Box<dyn Write + Send>) -> Self {
        Reporter {
            sink: Mutex::new(sink),
        }
    }

    /// Transient status line, overwritten by the next write.
    pub fn progress(&self, message: &str) {
        let mut sink = self.sink.lock().expect("reporter lock poisoned");
        let _ = write!(sink, "\r{}{}", CLEAR_LINE, message);
        let _ = sink.flush();
    }

    /// Durable column-aligned result line. Fields print in a fixed order
    /// and only when present, so every mode keeps its own column set.
    pub fn result_row(
        &self,
        host: &str,
        status: Option<&str>,
        server: Option<&str>,
        sni: Option<&str>,
        hostname: &str,
    ) {
        let mut line = format!("{:<15}", host);
        if let Some(status) = status {
            line.push_str(&format!("  {:<4}", status));
        }
        if let Some(server) = server {
            line.push_str(&format!("  {:<20}", server));
        }
        if let Some(sni) = sni {
            line.push_str(&format!("  {:<4}", sni));
        }
        line.push_str("  ");
        line.push_str(hostname);

        let highlight = server.map_or(false, |s| HIGH_VALUE_SERVERS.contains(s))
            || sni.map_or(false, |s| s == "yes");
        let line = if highlight {
            line.as_str().green().bold().to_string()
        } else {
            line
        };

        let mut sink = self.sink.lock().expect("reporter lock poisoned");
        let _ = writeln!(sink, "\r{}{}", CLEAR_LINE, line);
        let _ = sink.flush();
    }

    /// Multi-line block for one proxy result: summary plus one line per
    /// response header.
    pub fn proxy_block(&self, result: &ProxyResult) {
        let mut block = format!(
            "{} -> {} {} ({})\n",
            result.proxy, result.method, result.url, result.status_code
        );
        for (name, value) in &result.headers {
            block.push_str(&format!("|   {}: {}\n", name, value));
        }
        block.push_str("|\n");

        let mut sink = self.sink.lock().expect("reporter lock poisoned");
        let _ = writeln!(sink, "\r{}{}", CLEAR_LINE, block);
        let _ = sink.flush();
    }
}
