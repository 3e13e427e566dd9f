use std::path::PathBuf;

use anyhow::Context;

/// Optional per-chunk dump of prompts and responses. The directory is created on the
/// first write, so a run that fails before any chunk leaves nothing behind.
pub struct TraceWriter {
    dir: PathBuf,
    enabled: bool,
}

impl TraceWriter {
    pub fn new(dir: PathBuf, enabled: bool) -> Self {
        Self { dir, enabled }
    }

    /// Writes `chunk_<ordinal>.<kind>.txt`, zero-padded so files sort in chunk order.
    pub fn write_chunk_text(&self, ordinal: usize, kind: &str, text: &str) -> anyhow::Result<()> {
        if !self.enabled {
            return Ok(());
        }
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create trace dir: {}", self.dir.display()))?;
        let path = self.dir.join(format!("chunk_{ordinal:06}.{kind}.txt"));
        std::fs::write(&path, text).with_context(|| format!("write trace: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_numbered_chunk_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let trace_dir = dir.path().join("_trace");
        let trace = TraceWriter::new(trace_dir.clone(), true);
        assert!(!trace_dir.exists());

        trace.write_chunk_text(3, "prompt", "p").expect("write");
        let body = std::fs::read_to_string(trace_dir.join("chunk_000003.prompt.txt")).expect("read");
        assert_eq!(body, "p");
    }

    #[test]
    fn disabled_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let trace = TraceWriter::new(dir.path().join("_trace"), false);
        trace.write_chunk_text(1, "prompt", "p").expect("noop");
        assert!(!dir.path().join("_trace").exists());
    }

    #[test]
    fn unwritable_dir_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").expect("seed");
        let trace = TraceWriter::new(blocker.join("_trace"), true);
        assert!(trace.write_chunk_text(1, "prompt", "p").is_err());
    }
}
