use crate::utils::error::Result;
use std::io::Read;
use std::path::Path;

/// Reads the recipient list: the first field of every non-blank CSV row.
/// A missing file is an empty list.
pub fn load_recipients(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    match std::fs::File::open(path) {
        Ok(file) => parse_recipients(file),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("{} not found.", path.display());
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

pub fn parse_recipients<R: Read>(reader: R) -> Result<Vec<String>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut recipients = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        if let Some(address) = record.get(0).map(str::trim).filter(|a| !a.is_empty()) {
            recipients.push(address.to_string());
        }
    }

    Ok(recipients)
}
