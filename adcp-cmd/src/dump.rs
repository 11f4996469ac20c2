use std::io::{stdout, BufWriter, Write};
use std::path::Path;

use adcp::{decode_ensembles, PipelineOpts};
use anyhow::{Context, Result};
use tracing::info;

use crate::open_input;

pub fn dump(input: &Path, raw: bool, opts: &PipelineOpts) -> Result<()> {
    let reader = open_input(input)?;
    let mut ensembles =
        decode_ensembles(reader, opts.clone()).context("starting decoder thread")?;

    let mut out = BufWriter::new(stdout().lock());
    for zult in ensembles.by_ref() {
        let mut ensemble = zult.context("reading input")?;
        if !raw {
            ensemble.raw.clear();
        }
        serde_json::to_writer(&mut out, &ensemble).context("serializing ensemble")?;
        out.write_all(b"\n").context("writing to stdout")?;
    }
    out.flush().context("writing to stdout")?;

    if let Some(stats) = ensembles.stats() {
        info!(
            ensembles = stats.decoder.ensembles,
            checksum_failures = stats.decoder.checksum_failures,
            malformed = stats.decoder.malformed,
            "done"
        );
    }
    Ok(())
}
