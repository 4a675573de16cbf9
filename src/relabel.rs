use crate::utils::error::{PrepError, Result};
use clap::Args;
use csv::StringRecord;
use log::info;
use std::io;
use std::path::{Path, PathBuf};

pub const LABEL_COLUMN: &str = "Label";
pub const CATEGORY_COLUMN: &str = "Label_1_Virus_category";
pub const CLASSIFICATION_COLUMN: &str = "Tipo_Classificacao";
pub const DROPPED_COLUMNS: [&str; 2] = ["Dataset_type", "Label_2_Virus_category"];

/// Label the dataset publisher uses for pneumonia rows. The misspelling is
/// part of the data and must be matched as-is.
pub const PNEUMONIA_LABEL: &str = "Pnemonia";
pub const NORMAL_LABEL: &str = "Normal";
pub const VIRUS_CATEGORY: &str = "Virus";
pub const BACTERIA_CATEGORY: &str = "bacteria";

const PREVIEW_ROWS: usize = 5;

/// Relabel parameters
#[derive(Args, Debug, Clone)]
pub struct RelabelArgs {
    /// Metadata CSV to classify
    #[arg(short, long, default_value = "coronahack_dataset/Chest_xray_Corona_Metadata.csv")]
    pub input: PathBuf,

    /// Where to write the classified CSV
    #[arg(short, long, default_value = "Chest_xray_Corona_Metadata_Classified.csv")]
    pub output: PathBuf,
}

/// Diagnostic category derived from `Label` and `Label_1_Virus_category`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// `Label` is neither "Normal" nor "Pnemonia"; kept with an empty value
    Unclassified,
    Normal,
    ViralPneumonia,
    BacterialPneumonia,
    /// Pneumonia of any other cause; these rows are removed
    OtherPneumonia,
}

impl Classification {
    pub fn classify(label: &str, category: &str) -> Self {
        match (label, category) {
            (NORMAL_LABEL, _) => Self::Normal,
            (PNEUMONIA_LABEL, VIRUS_CATEGORY) => Self::ViralPneumonia,
            (PNEUMONIA_LABEL, BACTERIA_CATEGORY) => Self::BacterialPneumonia,
            (PNEUMONIA_LABEL, _) => Self::OtherPneumonia,
            _ => Self::Unclassified,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unclassified => "",
            Self::Normal => "Normal",
            Self::ViralPneumonia => "Pneumonia Viral",
            Self::BacterialPneumonia => "Pneumonia Bacteriana",
            Self::OtherPneumonia => "Outros tipos de Pneumonia",
        }
    }

    pub fn is_retained(&self) -> bool {
        *self != Self::OtherPneumonia
    }
}

/// Header plus rows of a CSV metadata file, all values kept as text
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataTable {
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl MetadataTable {
    pub fn read(path: &Path) -> Result<Self> {
        let reader = csv::Reader::from_path(path)?;
        Self::from_csv(reader)
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        Self::from_csv(csv::Reader::from_reader(reader))
    }

    /// Empty header cells (the unnamed index column of the published file)
    /// become `Unnamed: <position>`, matching how pandas names them.
    fn from_csv<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Self> {
        let headers = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, header)| {
                if header.is_empty() {
                    format!("Unnamed: {}", i)
                } else {
                    header.to_string()
                }
            })
            .collect();
        let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { headers, rows })
    }

    /// Write with a header row and no index column
    pub fn write(&self, path: &Path) -> Result<()> {
        let writer = csv::Writer::from_path(path)?;
        self.write_csv(writer)
    }

    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<()> {
        self.write_csv(csv::Writer::from_writer(writer))
    }

    fn write_csv<W: io::Write>(&self, mut writer: csv::Writer<W>) -> Result<()> {
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn headers(&self) -> Vec<&str> {
        self.headers.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of `column` for every row
    pub fn column(&self, column: &str) -> Result<Vec<&str>> {
        let index = self.column_index(column)?;
        Ok(self
            .rows
            .iter()
            .map(|row| row.get(index).unwrap_or(""))
            .collect())
    }

    /// Log the header and the first `n` rows
    pub fn log_head(&self, n: usize) {
        info!("  {}", self.headers.iter().collect::<Vec<_>>().join(", "));
        for (i, row) in self.rows.iter().take(n).enumerate() {
            info!("  {}: {}", i, row.iter().collect::<Vec<_>>().join(", "));
        }
    }

    fn column_index(&self, column: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|header| header == column)
            .ok_or_else(|| PrepError::MissingColumn(column.to_string()))
    }
}

/// Outcome of a relabel run
#[derive(Debug, Clone, PartialEq)]
pub struct RelabelReport {
    pub rows_read: usize,
    pub rows_written: usize,
    pub rows_removed: usize,
    /// Rows per classification, most frequent first
    pub value_counts: Vec<(String, usize)>,
}

/// Classify every row, remove "other pneumonia" rows, drop the unused
/// columns and append the classification column.
pub fn relabel_table(table: MetadataTable) -> Result<(MetadataTable, RelabelReport)> {
    let label_index = table.column_index(LABEL_COLUMN)?;
    let category_index = table.column_index(CATEGORY_COLUMN)?;
    let dropped = DROPPED_COLUMNS
        .iter()
        .map(|column| table.column_index(column))
        .collect::<Result<Vec<_>>>()?;

    let rows_read = table.rows.len();
    let keep = |index: &usize| !dropped.contains(index);

    let mut headers: StringRecord = table
        .headers
        .iter()
        .enumerate()
        .filter(|(i, _)| keep(i))
        .map(|(_, header)| header)
        .collect();
    headers.push_field(CLASSIFICATION_COLUMN);

    let mut rows = Vec::with_capacity(rows_read);
    let mut value_counts: Vec<(String, usize)> = Vec::new();

    for row in &table.rows {
        let classification = Classification::classify(
            row.get(label_index).unwrap_or(""),
            row.get(category_index).unwrap_or(""),
        );
        if !classification.is_retained() {
            continue;
        }

        let mut record: StringRecord = row
            .iter()
            .enumerate()
            .filter(|(i, _)| keep(i))
            .map(|(_, value)| value)
            .collect();
        record.push_field(classification.as_str());
        rows.push(record);

        match value_counts
            .iter_mut()
            .find(|(value, _)| value == classification.as_str())
        {
            Some((_, count)) => *count += 1,
            None => value_counts.push((classification.as_str().to_string(), 1)),
        }
    }

    // stable: ties keep first-seen order
    value_counts.sort_by(|a, b| b.1.cmp(&a.1));

    let report = RelabelReport {
        rows_read,
        rows_written: rows.len(),
        rows_removed: rows_read - rows.len(),
        value_counts,
    };

    Ok((MetadataTable { headers, rows }, report))
}

/// Read the metadata file, relabel it and write the classified copy
pub fn relabel_file(args: &RelabelArgs) -> Result<RelabelReport> {
    info!("Loading metadata from {}", args.input.display());
    let table = MetadataTable::read(&args.input)?;

    let (classified, report) = relabel_table(table)?;

    info!("First {} rows of the classified table:", PREVIEW_ROWS);
    classified.log_head(PREVIEW_ROWS);

    info!("Rows per '{}':", CLASSIFICATION_COLUMN);
    for (value, count) in &report.value_counts {
        info!("  {:<24} {}", value, count);
    }

    classified.write(&args.output)?;
    info!(
        "Wrote {} rows to {} ({} removed)",
        report.rows_written,
        args.output.display(),
        report.rows_removed
    );

    Ok(report)
}
