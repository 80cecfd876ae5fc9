//! Results output formatting (CSV).

use crate::analysis::{PointOutcome, SweepResult};
use crate::error::Result;
use std::io::Write;

/// Write sweep results as CSV, one row per point in sweep order.
///
/// Format:
/// ```csv
/// wavelength_nm,voltage,power_in,alpha,power_out,photocurrent,device_voltage,field,status
/// 930,-4,10,802.384,0.603,7.047,-3.295,396046.1,converged
/// 930,-4,90,,,,,,failed: iterate left the physical domain at iteration 0: ...
/// ```
///
/// Failed points leave the solution columns empty.
pub fn write_sweep_csv<W: Write>(result: &SweepResult, writer: &mut W) -> Result<()> {
    writeln!(
        writer,
        "wavelength_nm,voltage,power_in,alpha,power_out,photocurrent,device_voltage,field,status"
    )?;
    for outcome in &result.outcomes {
        let p = outcome.point();
        write!(writer, "{},{},{}", p.wavelength_nm, p.applied_voltage, p.power_in)?;
        match outcome {
            PointOutcome::Converged(s) => writeln!(
                writer,
                ",{},{},{},{},{},converged",
                s.alpha, s.power_out, s.photocurrent, s.device_voltage, s.field
            )?,
            PointOutcome::Failed { reason, .. } => {
                // Keep the row to a fixed column count.
                let reason = reason.to_string().replace(',', ";");
                writeln!(writer, ",,,,,,failed: {reason}")?
            }
        }
    }
    Ok(())
}
