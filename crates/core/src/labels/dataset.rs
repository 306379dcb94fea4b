//! CSV loaders and writers for ground-truth and prediction label sets.
//!
//! Files are read by header name, so column order does not matter. Malformed
//! records are logged and skipped; evaluation input never aborts a run.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use thiserror::Error;

use crate::labels::{ground_truth_label, normalize_attack_label};
use crate::model::{FunctionAnnotation, LabelMap};

pub const FUNCTION_NAME_COLUMN: &str = "function_name";
pub const ATTACK_TYPE_COLUMN: &str = "attack_type";
pub const LABEL_COLUMN: &str = "label";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error on {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

pub type DatasetResult<T> = Result<T, DatasetError>;

/// Column lookup by header name.
struct Columns {
    headers: StringRecord,
}

impl Columns {
    fn index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn get<'r>(&self, record: &'r StringRecord, name: &str) -> Option<&'r str> {
        self.index(name).and_then(|i| record.get(i))
    }
}

fn open_reader(path: &Path) -> DatasetResult<(csv::Reader<std::fs::File>, Columns)> {
    let file = std::fs::File::open(path)
        .map_err(|source| DatasetError::Io { path: path.to_path_buf(), source })?;
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
    let headers = reader
        .headers()
        .map_err(|source| DatasetError::Csv { path: path.to_path_buf(), source })?
        .clone();
    let columns = Columns { headers };
    if columns.index(FUNCTION_NAME_COLUMN).is_none() {
        log::warn!(
            "{} has no '{}' column; no rows will load",
            path.display(),
            FUNCTION_NAME_COLUMN
        );
    }
    Ok((reader, columns))
}

/// Visit each well-formed record with a non-empty trimmed function name.
fn for_each_named_row(
    path: &Path,
    mut visit: impl FnMut(&Columns, &str, &StringRecord),
) -> DatasetResult<()> {
    let (mut reader, columns) = open_reader(path)?;
    for (idx, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(err) => {
                log::warn!("Skipping malformed row {} in {}: {err}", idx + 2, path.display());
                continue;
            }
        };
        let name = columns.get(&record, FUNCTION_NAME_COLUMN).unwrap_or("").trim();
        if name.is_empty() {
            continue;
        }
        visit(&columns, name, &record);
    }
    Ok(())
}

/// Load ground-truth labels: `function_name -> label`.
///
/// Accepts `function_name,attack_type[,language[,label]]`. A valid integer in
/// `label` takes precedence over `attack_type`. Rows without any usable label
/// are not recorded. Later rows overwrite earlier ones.
pub fn load_ground_truth(path: &Path) -> DatasetResult<LabelMap> {
    let mut labels = LabelMap::new();
    for_each_named_row(path, |columns, name, record| {
        let label = ground_truth_label(
            columns.get(record, LABEL_COLUMN),
            columns.get(record, ATTACK_TYPE_COLUMN),
        );
        match label {
            Some(label) => {
                labels.insert(name.to_string(), label);
            }
            None => log::debug!("No label for ground-truth function {name}"),
        }
    })?;
    Ok(labels)
}

/// Load predicted labels from a `function_name,attack_type` CSV.
pub fn load_predictions(path: &Path) -> DatasetResult<LabelMap> {
    let mut labels = LabelMap::new();
    for_each_named_row(path, |columns, name, record| {
        let raw = columns.get(record, ATTACK_TYPE_COLUMN).unwrap_or("");
        if let Some(label) = normalize_attack_label(raw) {
            labels.insert(name.to_string(), label);
        }
    })?;
    Ok(labels)
}

/// Copy the ground-truth rows whose function name is in `keep` to `dest`,
/// preserving the original header and column order. Returns rows written.
pub fn write_ground_truth_subset(
    source: &Path,
    dest: &Path,
    keep: &BTreeSet<String>,
) -> DatasetResult<usize> {
    let (mut reader, columns) = open_reader(source)?;
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(dest)
        .map_err(|source| DatasetError::Csv { path: dest.to_path_buf(), source })?;
    let csv_err = |source| DatasetError::Csv { path: dest.to_path_buf(), source };

    writer.write_record(&columns.headers).map_err(csv_err)?;
    let mut kept = 0;
    for record in reader.records() {
        let Ok(record) = record else { continue };
        let name = columns.get(&record, FUNCTION_NAME_COLUMN).unwrap_or("").trim();
        if keep.contains(name) {
            writer.write_record(&record).map_err(csv_err)?;
            kept += 1;
        }
    }
    writer
        .flush()
        .map_err(|source| DatasetError::Io { path: dest.to_path_buf(), source })?;
    Ok(kept)
}

/// Write predictions as `function_name,attack_type`.
pub fn write_annotations_csv(path: &Path, annotations: &[FunctionAnnotation]) -> DatasetResult<()> {
    let csv_err = |source| DatasetError::Csv { path: path.to_path_buf(), source };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer.write_record([FUNCTION_NAME_COLUMN, ATTACK_TYPE_COLUMN]).map_err(csv_err)?;
    for annotation in annotations {
        let label = annotation.attack_type.to_string();
        writer.write_record([annotation.function_name.as_str(), label.as_str()]).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| DatasetError::Io { path: path.to_path_buf(), source })?;
    Ok(())
}
