//! `ureaplan backends`

use anyhow::Result;
use std::io::{self, Write};
use tabwriter::TabWriter;
use ureaplan_algo::MilpBackend;

pub fn handle() -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "BACKEND\tDEFAULT\tTIME LIMIT / MIP GAP")?;
    for name in MilpBackend::available() {
        let backend: MilpBackend = name.parse()?;
        writeln!(
            writer,
            "{}\t{}\t{}",
            backend.as_str(),
            if backend == MilpBackend::default() { "yes" } else { "" },
            if backend.supports_limits() { "honoured" } else { "ignored" }
        )?;
    }
    writer.flush()?;
    Ok(())
}
