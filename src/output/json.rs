use crate::leads::Lead;
use crate::output::traits::OutputResult;
use std::io::Write;

/// Writes `leads` as one pretty-printed JSON array
pub fn write_leads_json(out: &mut impl Write, leads: &[Lead]) -> OutputResult<()> {
    serde_json::to_writer_pretty(&mut *out, leads)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
