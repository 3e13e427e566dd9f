use std::io::{self, Write};
use std::path::Path;
use std::time::Instant;

/// Per-chunk progress lines on stderr, prefixed with the elapsed time.
pub struct ConsoleProgress {
    enabled: bool,
    t0: Instant,
}

impl ConsoleProgress {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            t0: Instant::now(),
        }
    }

    /// Announces the chunk about to be sent; ordinals start at 1.
    pub fn chunk(&self, ordinal: usize, total: usize) {
        self.line(chunk_line(ordinal, total));
    }

    /// Characters of the source translated so far.
    pub fn chars(&self, done: usize, total: usize) {
        self.line(chars_line(done, total));
    }

    pub fn saved(&self, output: &Path) {
        self.line(format!("✅ Перевод сохранен в {}", output.display()));
    }

    fn line(&self, msg: String) {
        if !self.enabled {
            return;
        }
        let ts = fmt_elapsed(self.t0.elapsed().as_secs_f64());
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "[{ts}] {msg}");
    }
}

fn chunk_line(ordinal: usize, total: usize) -> String {
    format!("Перевод части {ordinal}/{total}...")
}

fn chars_line(done: usize, total: usize) -> String {
    let total = total.max(1);
    let done = done.min(total);
    let pct = (done as f64 / total as f64) * 100.0;
    format!("Символов {done}/{total} ({pct:5.1}%)")
}

fn fmt_elapsed(seconds: f64) -> String {
    let seconds = seconds.max(0.0) as u64;
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    if h > 0 {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}
