use anyhow::{Context, Result};
use patternscan::PatternRecord;
use std::io::Write;
use std::path::Path;

const HEADER: [&str; 8] = [
    "symbol",
    "pattern",
    "confidence",
    "price",
    "change_percent",
    "volume",
    "rs",
    "detected_at",
];

/// Writes `patterns` as CSV with a header row.
pub fn write_csv<'a, W, I>(writer: W, patterns: I) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a PatternRecord>,
{
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADER)?;

    let mut rows = 0;
    for p in patterns {
        csv.write_record([
            p.symbol.clone(),
            p.pattern.clone(),
            format!("{:.4}", p.confidence),
            format!("{:.2}", p.price),
            format!("{:.2}", p.change_percent),
            p.volume.to_string(),
            p.rs.map(|rs| format!("{rs:.2}")).unwrap_or_default(),
            p.detected_at().map(|t| t.to_rfc3339()).unwrap_or_default(),
        ])?;
        rows += 1;
    }
    csv.flush()?;
    Ok(rows)
}

pub fn export_csv<'a, I>(path: &Path, patterns: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a PatternRecord>,
{
    let file = std::fs::File::create(path).with_context(|| format!("create {:?}", path))?;
    write_csv(file, patterns).with_context(|| format!("write csv {:?}", path))
}
