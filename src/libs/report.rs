use crate::libs::chaining::AlignPath;
use crate::libs::pipeline::{QueryRecord, Reporter};
use crate::libs::psl::Psl;
use crate::libs::sfx::SuffixIndex;
use anyhow::anyhow;
use std::io::Write;
use std::sync::Mutex;

/// A writer shared by all workers; each call writes one whole buffer under the lock
pub struct OutputSink {
    out: Mutex<Box<dyn Write + Send>>,
}

impl OutputSink {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn write_all(&self, buf: &[u8]) -> anyhow::Result<()> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| anyhow!("output writer poisoned"))?;
        out.write_all(buf)?;
        Ok(())
    }

    pub fn flush(&self) -> anyhow::Result<()> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| anyhow!("output writer poisoned"))?;
        out.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Psl,
    Bed,
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "psl" => Ok(OutputFormat::Psl),
            "bed" => Ok(OutputFormat::Bed),
            _ => Err(anyhow!("Unknown output format: {}", s)),
        }
    }
}

/// Writes every path as a PSL or BED line. Lines of one query are never interleaved
/// with another query's.
pub struct PathReporter {
    sink: OutputSink,
    format: OutputFormat,
}

impl PathReporter {
    pub fn new(sink: OutputSink, format: OutputFormat) -> Self {
        Self { sink, format }
    }

    pub fn finish(&self) -> anyhow::Result<()> {
        self.sink.flush()
    }
}

impl<R: AsRef<str> + Sync> Reporter<R> for PathReporter {
    fn report(
        &self,
        index: &SuffixIndex<R>,
        query: &QueryRecord,
        paths: &[AlignPath],
    ) -> anyhow::Result<()> {
        if paths.is_empty() {
            return Ok(());
        }

        let mut buf = Vec::new();
        for path in paths {
            let psl = Psl::from_path(
                path,
                &query.name,
                query.seq.len(),
                index.target_ref(path.seq_idx).as_ref(),
                index.seq_len(path.seq_idx),
            );
            match self.format {
                OutputFormat::Psl => psl.write_to(&mut buf)?,
                OutputFormat::Bed => psl.write_bed_to(&mut buf)?,
            }
        }
        self.sink.write_all(&buf)
    }
}
