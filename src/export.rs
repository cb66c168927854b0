/*!
 * Export functionality for fetched provider records
 *
 * Records serialize back to the JSON the registry sent, so the JSON exporters
 * are lossless. The CSV exporter flattens each record to one summary row.
 */

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::data_types::*;
use crate::{BloomError, ExportFormat, Result};

/// Trait for implementing record exporters
pub trait RecordExporter {
    /// Write records to any writer
    fn write_records(&self, records: &[ProviderRecord], writer: &mut dyn Write) -> Result<()>;

    /// Get the export format
    fn format(&self) -> ExportFormat;

    /// Write records to a file, replacing it if it exists
    fn export(&self, records: &[ProviderRecord], path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_records(records, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// Pick the exporter for a format with its default settings
pub fn exporter_for(format: ExportFormat) -> Box<dyn RecordExporter> {
    match format {
        ExportFormat::Json => Box::new(JsonExporter::new()),
        ExportFormat::JsonLines => Box::new(JsonExporter::new().as_json_lines()),
        ExportFormat::Csv => Box::new(CsvExporter::new()),
    }
}

/// JSON exporter for provider records
pub struct JsonExporter {
    /// Whether to pretty-print the JSON
    pub pretty_print: bool,
    /// Whether to export as JSON Lines (one record per line)
    pub json_lines: bool,
}

impl Default for JsonExporter {
    fn default() -> Self {
        Self {
            pretty_print: true,
            json_lines: false,
        }
    }
}

impl JsonExporter {
    /// Create a new JSON exporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Set pretty printing
    pub fn with_pretty_print(mut self, pretty: bool) -> Self {
        self.pretty_print = pretty;
        self
    }

    /// Set JSON Lines format
    pub fn as_json_lines(mut self) -> Self {
        self.json_lines = true;
        self.pretty_print = false; // JSON Lines shouldn't be pretty printed
        self
    }

    fn json_error(&self, err: serde_json::Error) -> BloomError {
        BloomError::Export {
            message: err.to_string(),
            format: self.format(),
        }
    }
}

impl RecordExporter for JsonExporter {
    fn write_records(&self, records: &[ProviderRecord], writer: &mut dyn Write) -> Result<()> {
        if self.json_lines {
            for record in records {
                serde_json::to_writer(&mut *writer, record).map_err(|e| self.json_error(e))?;
                writeln!(writer)?;
            }
        } else if self.pretty_print {
            serde_json::to_writer_pretty(&mut *writer, records).map_err(|e| self.json_error(e))?;
            writeln!(writer)?;
        } else {
            serde_json::to_writer(&mut *writer, records).map_err(|e| self.json_error(e))?;
            writeln!(writer)?;
        }

        Ok(())
    }

    fn format(&self) -> ExportFormat {
        if self.json_lines {
            ExportFormat::JsonLines
        } else {
            ExportFormat::Json
        }
    }
}

/// CSV exporter writing one summary row per record
pub struct CsvExporter {
    /// Whether to include headers
    pub include_headers: bool,
    /// Field delimiter
    pub delimiter: u8,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self {
            include_headers: true,
            delimiter: b',',
        }
    }
}

/// Columns written by [`CsvExporter`]
pub const CSV_COLUMNS: [&str; 8] = [
    "npi",
    "type",
    "name",
    "city",
    "state",
    "zip",
    "primary_taxonomy",
    "active",
];

impl CsvExporter {
    /// Create a new CSV exporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set whether the header row is written
    pub fn with_headers(mut self, include: bool) -> Self {
        self.include_headers = include;
        self
    }

    fn row(record: &ProviderRecord) -> [String; 8] {
        let provider = record.provider();
        let address = provider.practice_address()
            .filter(|a| !a.is_empty())
            .or_else(|| provider.business_address())
            .unwrap_or_default();
        let name = match record {
            ProviderRecord::Individual(individual) => individual.full_name(),
            _ => record.display_name(),
        };

        [
            record.npi().unwrap_or_default(),
            record.entity_type().option_display(),
            name,
            address.city().unwrap_or("").to_string(),
            address.state().unwrap_or("").to_string(),
            address.zip().unwrap_or_default(),
            provider.primary_specialty()
                .and_then(|s| s.code().map(str::to_string))
                .unwrap_or_default(),
            provider.is_active().to_string(),
        ]
    }
}

impl RecordExporter for CsvExporter {
    fn write_records(&self, records: &[ProviderRecord], writer: &mut dyn Write) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .from_writer(writer);

        if self.include_headers {
            csv_writer.write_record(CSV_COLUMNS)?;
        }

        for record in records {
            csv_writer.write_record(Self::row(record))?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::build_providers;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_records() -> Vec<ProviderRecord> {
        build_providers(json!([
            {
                "npi": 1111111111u64,
                "type": "individual",
                "first_name": "JANE",
                "last_name": "DOE",
                "credential": "MD",
                "practice_address": {"city": "ALBANY", "state": "NY", "zip": "12207"},
                "provider_details": [{"healthcare_taxonomy_code": "207Q00000X", "taxonomy_switch": "yes"}]
            },
            {
                "npi": 2222222222u64,
                "type": "organization",
                "name": "ACME HEALTH, INC",
                "business_address": {"city": "TROY", "state": "NY"},
                "deactivation_date": "2015-01-01"
            }
        ]))
        .unwrap()
    }

    #[test]
    fn test_csv_export_rows() {
        let mut out = Vec::new();
        CsvExporter::new().write_records(&sample_records(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "npi,type,name,city,state,zip,primary_taxonomy,active");
        assert_eq!(lines[1], "1111111111,Individual,JANE DOE (MD),ALBANY,NY,12207,207Q00000X,true");
        assert_eq!(lines[2], "2222222222,Organization,\"ACME HEALTH, INC\",TROY,NY,,,false");
    }

    #[test]
    fn test_json_lines_round_trip_raw_records() {
        let records = sample_records();
        let mut out = Vec::new();
        JsonExporter::new().as_json_lines().write_records(&records, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let first: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(&first, &serde_json::to_value(&records[0]).unwrap());
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn test_export_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("providers.json");

        exporter_for(ExportFormat::Json).export(&sample_records(), &path).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.as_array().map(Vec::len), Some(2));
        assert_eq!(written[1]["name"], "ACME HEALTH, INC");
    }
}
