//! Result persistence for external plotting
//!
//! Sweep points go to a plain CSV (`c,train,validation,test,seconds`), and
//! evaluation summaries go to pretty-printed JSON. Parent directories are
//! created on demand.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::experiment::SweepPoint;

/// Header line of the sweep CSV.
pub const SWEEP_CSV_HEADER: &str = "c,train,validation,test,seconds";

fn create(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(BufWriter::new(File::create(path)?))
}

/// Write one CSV row per sweep point, in sweep order.
pub fn write_sweep_csv(path: &Path, points: &[SweepPoint]) -> Result<()> {
    let mut writer = create(path)?;
    writeln!(writer, "{SWEEP_CSV_HEADER}")?;
    for point in points {
        writeln!(
            writer,
            "{},{},{},{},{}",
            point.c, point.train_accuracy, point.validation_accuracy, point.test_accuracy, point.fit_seconds
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// Serialize `value` as pretty JSON.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut writer = create(path)?;
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// `"<label> set Accuracy: 92.37%"`
pub fn accuracy_line(label: &str, accuracy: f64) -> String {
    format!("{label} set Accuracy: {:.2}%", accuracy * 100.0)
}

/// Fixed-width table of sweep points for the console.
pub fn sweep_table(points: &[SweepPoint]) -> String {
    let mut out = format!(
        "{:>8} {:>10} {:>12} {:>10} {:>10}\n",
        "C", "train %", "validation %", "test %", "seconds"
    );
    for p in points {
        out.push_str(&format!(
            "{:>8} {:>10.2} {:>12.2} {:>10.2} {:>10.2}\n",
            p.c,
            p.train_accuracy * 100.0,
            p.validation_accuracy * 100.0,
            p.test_accuracy * 100.0,
            p.fit_seconds
        ));
    }
    out
}
