//! CSV export of extracted target records

use crate::extractor::TargetRecord;
use crate::DocxError;
use std::io::Write;

/// Column names, in output order
pub const HEADER: [&str; 5] = ["target", "center", "x", "y", "z"];

/// File name used when no output path is given
pub const DEFAULT_OUTPUT_NAME: &str = "extracted_targets.csv";

/// CSV output options
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter (default: `,`)
    pub delimiter: u8,
    /// Write the header row (default: true)
    pub header: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            header: true,
        }
    }
}

/// Write records as CSV
///
/// The header row is written even when there are no records.
pub fn write_csv<W: Write>(
    records: &[TargetRecord],
    writer: W,
    options: &CsvOptions,
) -> Result<(), DocxError> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(false)
        .from_writer(writer);

    if options.header {
        wtr.write_record(HEADER)?;
    }
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;

    Ok(())
}

/// Render records as a CSV string
pub fn to_csv_string(records: &[TargetRecord], options: &CsvOptions) -> Result<String, DocxError> {
    let mut buffer = Vec::new();
    write_csv(records, &mut buffer, options)?;
    String::from_utf8(buffer)
        .map_err(|e| DocxError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, x: &str, y: &str, z: &str) -> TargetRecord {
        TargetRecord::new(id.to_string(), x, y, z)
    }

    #[test]
    fn test_csv_rows() {
        let records = vec![record("Target1", "1.5", "-2.0", "3.25"), record("Target2", "0", "0", "0")];
        let csv = to_csv_string(&records, &CsvOptions::default()).unwrap();
        assert_eq!(
            csv,
            "target,center,x,y,z\n\
             Target1,1.5 m; -2.0 m; 3.25 m,1.5,-2.0,3.25\n\
             Target2,0 m; 0 m; 0 m,0,0,0\n"
        );
    }

    #[test]
    fn test_header_only_when_empty() {
        let csv = to_csv_string(&[], &CsvOptions::default()).unwrap();
        assert_eq!(csv, "target,center,x,y,z\n");
    }

    #[test]
    fn test_semicolon_delimiter_quotes_center() {
        let options = CsvOptions {
            delimiter: b';',
            header: false,
        };
        let csv = to_csv_string(&[record("Target3", "1", "2", "3")], &options).unwrap();
        assert_eq!(csv, "Target3;\"1 m; 2 m; 3 m\";1;2;3\n");
    }
}
