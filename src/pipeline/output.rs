use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::error::{PipelineError, Result};

/// Append-only writer for translated chunks. The file is closed when the writer drops.
pub struct OutputWriter {
    path: PathBuf,
    out: BufWriter<File>,
    chunks_written: usize,
}

impl OutputWriter {
    /// Creates the file, truncating existing content.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::create(&path).map_err(|e| PipelineError::io(&path, e))?;
        Ok(Self {
            path,
            out: BufWriter::new(file),
            chunks_written: 0,
        })
    }

    /// Writes one response followed by a newline and flushes it to disk.
    pub fn write_chunk(&mut self, text: &str) -> Result<()> {
        self.out
            .write_all(text.as_bytes())
            .and_then(|_| self.out.write_all(b"\n"))
            .and_then(|_| self.out.flush())
            .map_err(|e| PipelineError::io(&self.path, e))?;
        self.chunks_written += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<usize> {
        self.out
            .flush()
            .map_err(|e| PipelineError::io(&self.path, e))?;
        Ok(self.chunks_written)
    }

    pub fn chunks_written(&self) -> usize {
        self.chunks_written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_and_appends_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "stale content\n").expect("seed");

        let mut w = OutputWriter::create(&path).expect("create");
        w.write_chunk("один").expect("write");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "один\n");
        w.write_chunk("два").expect("write");
        assert_eq!(w.chunks_written(), 2);
        assert_eq!(w.finish().expect("finish"), 2);

        assert_eq!(std::fs::read_to_string(&path).expect("read"), "один\nдва\n");
    }

    #[test]
    fn create_fails_in_missing_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nope").join("out.txt");
        assert!(matches!(
            OutputWriter::create(&path),
            Err(PipelineError::Io { .. })
        ));
    }
}
