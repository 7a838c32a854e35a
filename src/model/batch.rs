use std::{io::Read, path::Path};

use anyhow::Context;

use crate::{
    foundation::error::{PagError, PagResult},
    model::modification::Modification,
};

/// One named output of a batch run.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BatchEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "crate::model::modification::deserialize_items")]
    pub modifications: Vec<Modification>,
}

impl BatchEntry {
    /// Output name, `output_<i>` when unnamed or blank.
    pub fn output_name(&self, position: usize) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => format!("output_{position}"),
        }
    }
}

pub fn batch_from_json_str(s: &str) -> PagResult<Vec<BatchEntry>> {
    serde_json::from_str(s).map_err(|e| PagError::serde(format!("parse batch configs: {e}")))
}

/// Rows become entries: the `name` column names the output and every other column, in
/// header order, becomes a text modification with an incrementing layer index.
pub fn batch_from_csv_reader<R: Read>(reader: R) -> PagResult<Vec<BatchEntry>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| PagError::serde(format!("read csv header: {e}")))?
        .clone();

    let mut out = Vec::new();
    for (row, record) in csv_reader.records().enumerate() {
        let record =
            record.map_err(|e| PagError::serde(format!("read csv row {}: {e}", row + 1)))?;
        let mut entry = BatchEntry::default();
        let mut layer_index = 0usize;
        for (key, value) in headers.iter().zip(record.iter()) {
            if key == "name" {
                entry.name = Some(value.to_string());
                continue;
            }
            entry.modifications.push(Modification::Text {
                layer_index,
                value: value.to_string(),
            });
            layer_index += 1;
        }
        out.push(entry);
    }
    Ok(out)
}

/// Load batch configs by extension: `.csv` as CSV, anything else as JSON.
pub fn load_batch(path: &Path) -> PagResult<Vec<BatchEntry>> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        let f = std::fs::File::open(path)
            .with_context(|| format!("open batch csv '{}'", path.display()))?;
        return batch_from_csv_reader(std::io::BufReader::new(f));
    }
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read batch configs '{}'", path.display()))?;
    batch_from_json_str(&s)
}

#[cfg(test)]
#[path = "../../tests/unit/model/batch.rs"]
mod tests;
