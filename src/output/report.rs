//! CSV report writer
//!
//! Column names embed the locale codes so a report is self-describing:
//! `price_ita`, `url_eng`, ...

use crate::config::Locale;
use crate::output::compare::ReportRow;
use crate::output::ReportError;
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Report header for the given locales
pub fn report_header(preferred: Locale, compare: Locale) -> Vec<String> {
    vec![
        "name".to_string(),
        "producer".to_string(),
        "bottle_size".to_string(),
        format!("price_{}", compare),
        format!("price_{}", preferred),
        "diff".to_string(),
        "awards".to_string(),
        format!("url_{}", compare),
        format!("url_{}", preferred),
    ]
}

/// Writes the header and `rows` to any writer
pub fn write_rows<W: Write>(
    writer: W,
    preferred: Locale,
    compare: Locale,
    rows: &[ReportRow],
) -> Result<(), ReportError> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(writer);

    writer.write_record(report_header(preferred, compare))?;
    for row in rows {
        writer.write_record([
            row.name.clone(),
            row.producer.clone(),
            row.bottle_size.to_string(),
            format!("{:.2}", row.price_compare),
            format!("{:.2}", row.price_preferred),
            format!("{:.2}", row.diff),
            row.awards.to_string(),
            row.url_compare.clone(),
            row.url_preferred.clone(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes the report to `path`, replacing any existing file
///
/// # Arguments
///
/// * `path` - Destination file
/// * `preferred` - The preferred locale
/// * `compare` - The compare locale
/// * `rows` - The rows, already ordered
///
/// # Returns
///
/// * `Ok(())` - The report was written
/// * `Err(ReportError)` - The file could not be created or written
pub fn write_report(
    path: &Path,
    preferred: Locale,
    compare: Locale,
    rows: &[ReportRow],
) -> Result<(), ReportError> {
    tracing::info!("Writing {} rows to {}", rows.len(), path.display());
    let file = File::create(path)?;
    write_rows(file, preferred, compare, rows)
}
