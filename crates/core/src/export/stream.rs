use rayon::prelude::*;

use crate::error::Result;
use crate::matrix::{check_block, DistributedMatrixBackend, RowBlock};

use super::sink::OutputSink;
use super::ExportConfig;

/// Read every block of `backend`, encode blocks in parallel with `encode`,
/// and append the encoded bytes to `sink` in block order.
///
/// At most `config.window()` blocks are resident at a time.
pub(crate) fn write_blocks_ordered<F>(
    backend: &dyn DistributedMatrixBackend,
    config: &ExportConfig,
    sink: &mut OutputSink,
    encode: F,
) -> Result<()>
where
    F: Fn(&RowBlock) -> Vec<u8> + Sync,
{
    let n_blocks = backend.n_blocks();
    let window = config.window();

    let mut start = 0;
    while start < n_blocks {
        let end = (start + window).min(n_blocks);
        let encoded: Vec<Vec<u8>> = (start..end)
            .into_par_iter()
            .map(|b| -> Result<Vec<u8>> {
                let block = backend.read_block(b)?;
                check_block(backend, b, &block)?;
                Ok(encode(&block))
            })
            .collect::<Result<Vec<_>>>()?;

        for buf in &encoded {
            sink.write_all(buf)?;
        }
        start = end;
    }
    Ok(())
}
