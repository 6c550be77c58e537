use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{KinshipError, Result};

use super::ExportConfig;

static STAGING_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Buffered output file.
///
/// In atomic mode bytes go to a staging file next to the target, which is
/// renamed over the target by [`OutputSink::finish`]. A sink dropped without
/// finishing removes its staging file.
pub(crate) struct OutputSink {
    target: PathBuf,
    staging: Option<PathBuf>,
    writer: Option<BufWriter<File>>,
    bytes: u64,
}

impl OutputSink {
    pub(crate) fn create(target: &Path, config: &ExportConfig) -> Result<Self> {
        let staging = if config.atomic {
            Some(staging_path(target))
        } else {
            None
        };
        let open_path = staging.as_deref().unwrap_or(target);
        let file = File::create(open_path).map_err(|e| KinshipError::io_failure(target, e))?;

        Ok(Self {
            target: target.to_path_buf(),
            staging,
            writer: Some(BufWriter::with_capacity(config.buffer_capacity.max(1), file)),
            bytes: 0,
        })
    }

    pub(crate) fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        if let Some(w) = self.writer.as_mut() {
            w.write_all(buf)
                .map_err(|e| KinshipError::io_failure(&self.target, e))?;
            self.bytes += buf.len() as u64;
        }
        Ok(())
    }

    /// Flush and publish the file. Returns the number of bytes written.
    pub(crate) fn finish(mut self) -> Result<u64> {
        if let Some(w) = self.writer.take() {
            let file = w
                .into_inner()
                .map_err(|e| KinshipError::io_failure(&self.target, e.into_error()))?;
            file.sync_all()
                .map_err(|e| KinshipError::io_failure(&self.target, e))?;
        }
        if let Some(staging) = self.staging.take() {
            if let Err(e) = fs::rename(&staging, &self.target) {
                let _ = fs::remove_file(&staging);
                return Err(KinshipError::io_failure(&self.target, e));
            }
        }
        Ok(self.bytes)
    }
}

impl Drop for OutputSink {
    fn drop(&mut self) {
        self.writer.take();
        if let Some(staging) = self.staging.take() {
            if let Err(e) = fs::remove_file(&staging) {
                log::warn!(
                    "Could not remove staging file '{}': {}",
                    staging.display(),
                    e
                );
            }
        }
    }
}

fn staging_path(target: &Path) -> PathBuf {
    let id = STAGING_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut name: OsString = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("export"));
    name.push(format!(".{}.{}.tmp", std::process::id(), id));
    target.with_file_name(name)
}
