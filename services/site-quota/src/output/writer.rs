use std::fmt;
use std::io::Write;
use std::str::FromStr;

use prettytable::{Cell, Row, Table};
use serde_json::{Map, Value};
use site_quota_engine::TenantQuotaRecord;

use super::columns::{QuotaColumn, DEFAULT_COLUMNS};
use super::OutputError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
    Count,
    Ids,
}

impl OutputFormat {
    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Count => "count",
            OutputFormat::Ids => "ids",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "count" => Ok(OutputFormat::Count),
            "ids" => Ok(OutputFormat::Ids),
            other => Err(format!(
                "unknown format {other:?}, expected one of table, csv, json, count, ids"
            )),
        }
    }
}

/// Writes quota records to `out` in the selected format.
///
/// `count`, `ids` and single-field output stream records as they arrive;
/// `table`, `csv` and `json` buffer them to lay out the document.
pub struct RecordsWriter<W> {
    out: W,
    format: OutputFormat,
    columns: Vec<QuotaColumn>,
    field: Option<QuotaColumn>,
}

impl<W: Write> RecordsWriter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            columns: DEFAULT_COLUMNS.to_vec(),
            field: None,
        }
    }

    pub fn with_columns(self, columns: Vec<QuotaColumn>) -> Self {
        Self { columns, ..self }
    }

    /// Prints only `field`, one value per line, ignoring the format.
    pub fn with_field(self, field: QuotaColumn) -> Self {
        Self {
            field: Some(field),
            ..self
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Renders `records`, stopping at the first error. Returns the number of
    /// records written.
    pub fn write_records<I, E>(&mut self, records: I) -> Result<usize, OutputError>
    where
        I: IntoIterator<Item = Result<TenantQuotaRecord, E>>,
        OutputError: From<E>,
    {
        let records = records.into_iter();

        if let Some(field) = self.field {
            let mut written = 0usize;
            for item in records {
                writeln!(self.out, "{}", field.display(&item?))?;
                written += 1;
            }
            return Ok(written);
        }

        match self.format {
            OutputFormat::Count => {
                let mut count = 0usize;
                for item in records {
                    item?;
                    count += 1;
                }
                writeln!(self.out, "{count}")?;
                Ok(count)
            }
            OutputFormat::Ids => {
                let mut ids = Vec::new();
                for item in records {
                    ids.push(item?.tenant_id.to_string());
                }
                writeln!(self.out, "{}", ids.join(" "))?;
                Ok(ids.len())
            }
            OutputFormat::Json => {
                let mut rows = Vec::new();
                for item in records {
                    rows.push(Value::Object(self.json_row(&item?)));
                }
                serde_json::to_writer(&mut self.out, &rows)?;
                writeln!(self.out)?;
                Ok(rows.len())
            }
            OutputFormat::Table | OutputFormat::Csv => {
                let mut table = Table::new();
                let header = Row::new(
                    self.columns
                        .iter()
                        .map(|column| Cell::new(column.name()))
                        .collect(),
                );
                if self.format == OutputFormat::Table {
                    table.set_titles(header);
                } else {
                    table.add_row(header);
                }

                let mut written = 0usize;
                for item in records {
                    table.add_row(self.table_row(&item?));
                    written += 1;
                }

                if self.format == OutputFormat::Table {
                    table.print(&mut self.out)?;
                } else {
                    let mut csv = table
                        .to_csv(&mut self.out)
                        .map_err(|err| OutputError::Csv(err.to_string()))?;
                    csv.flush()?;
                }
                Ok(written)
            }
        }
    }

    fn json_row(&self, record: &TenantQuotaRecord) -> Map<String, Value> {
        self.columns
            .iter()
            .map(|column| (column.name().to_string(), column.json_value(record)))
            .collect()
    }

    fn table_row(&self, record: &TenantQuotaRecord) -> Row {
        Row::new(
            self.columns
                .iter()
                .map(|column| Cell::new(&column.display(record)))
                .collect(),
        )
    }
}
