// ABOUTME: Console output for CLI feedback with secret redaction.
// ABOUTME: Owns the process-wide sensitive-value set applied to every console write.

use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::sync::LazyLock;
use tracing_subscriber::fmt::MakeWriter;

/// Values masked out of all console output for the rest of the process.
///
/// This is the one deliberate global: it is created empty at startup, grows as
/// credentials are learned and is never cleared.
static SENSITIVE: LazyLock<RwLock<BTreeSet<String>>> =
    LazyLock::new(|| RwLock::new(BTreeSet::new()));

/// Register a value to be masked in all subsequent output.
pub fn register_sensitive(value: &str) {
    if value.is_empty() {
        return;
    }

    SENSITIVE.write().insert(value.to_string());
}

/// Replace every registered sensitive value in `message` with a same-length mask.
pub fn redact(message: &str) -> String {
    let sensitive = SENSITIVE.read();

    if sensitive.is_empty() {
        return message.to_string();
    }

    // Longest first, so a secret containing another secret is masked whole.
    let mut values: Vec<&String> = sensitive.iter().collect();
    values.sort_by_key(|value| std::cmp::Reverse(value.len()));

    let mut message = message.to_string();
    for value in values {
        message = message.replace(value.as_str(), &"*".repeat(value.chars().count()));
    }
    message
}

const CLEAR: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";
const BLUE: &str = "\x1b[34m";
const PURPLE: &str = "\x1b[35m";
const CYAN: &str = "\x1b[36m";

/// Print a section message.
pub fn section(message: &str) {
    show(&format!("==> {message}"), BLUE);
}

/// Print a subsection message.
pub fn subsection(message: &str) {
    show(&format!("--> {message}"), CYAN);
}

/// Print a warning message.
pub fn warning(message: &str) {
    show(&format!("WARNING: {message}"), PURPLE);
}

/// Print a fatal message.
pub fn fatal(message: &str) {
    show(&format!("FATAL: {message}"), RED);
}

fn show(message: &str, color: &str) {
    let message = redact(message);
    let mut stdout = io::stdout().lock();
    // A closed stdout is not worth failing the command over.
    let _ = writeln!(stdout, "{color}{message}{CLEAR}");
    let _ = stdout.flush();
}

/// Stderr writer for the tracing subscriber that masks sensitive values.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedactingWriter;

impl<'a> MakeWriter<'a> for RedactingWriter {
    type Writer = RedactingLine;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingLine { buffer: Vec::new() }
    }
}

/// Buffers one formatted event and writes it redacted when dropped.
pub struct RedactingLine {
    buffer: Vec<u8>,
}

impl Write for RedactingLine {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for RedactingLine {
    fn drop(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let text = redact(&String::from_utf8_lossy(&self.buffer));
        let _ = io::stderr().lock().write_all(text.as_bytes());
    }
}
