//! CSV tables and copied manual files.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;
use crate::matcher::MatchQuery;

/// Read every row of a headed CSV file.
pub fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| StoreError::csv(path, e))?;
    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| StoreError::csv(path, e))
}

/// Append rows to a CSV file. The header is written only when this call
/// creates the file, so repeated appends share one header.
pub fn append_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), StoreError> {
    if rows.is_empty() {
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }

    let exists = path.exists();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| StoreError::io(path, e))?;
    let mut writer = csv::WriterBuilder::new().has_headers(!exists).from_writer(file);
    for row in rows {
        writer.serialize(row).map_err(|e| StoreError::csv(path, e))?;
    }
    writer.flush().map_err(|e| StoreError::io(path, e))
}

pub fn remove_if_exists(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(StoreError::io(path, e)),
        _ => Ok(()),
    }
}

/// `<out_dir>/<brand>/<name><ext>`: slashes in the desired name become `_`,
/// spaces become `-`, and the extension is taken from the source manual.
pub fn destination_for(out_dir: &Path, brand: &str, name: &str, source: &Path) -> PathBuf {
    let mut file_name = name.replace('/', "_").replace(' ', "-");
    if let Some(ext) = source.extension() {
        file_name.push('.');
        file_name.push_str(&ext.to_string_lossy());
    }
    out_dir.join(brand).join(file_name)
}

pub fn copy_manual(source: &Path, destination: &Path) -> Result<(), StoreError> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    fs::copy(source, destination).map_err(|e| StoreError::io(source, e))?;
    Ok(())
}

/// Product columns plus the manual that was copied for it.
#[derive(Debug, Serialize)]
pub struct FoundRow<'a> {
    #[serde(rename = "manufacturerSKU")]
    pub manufacturer_sku: &'a str,
    pub brand: &'a str,
    #[serde(rename = "c__series")]
    pub series: &'a str,
    #[serde(rename = "c__productCategory")]
    pub category: &'a str,
    #[serde(rename = "installationManualFileName(.pdf)")]
    pub manual_file_name: &'a str,
    /// Relative to the manuals root.
    pub matched_manual: &'a str,
}

impl<'a> FoundRow<'a> {
    pub fn new(query: &'a MatchQuery, matched_manual: &'a str) -> Self {
        FoundRow {
            manufacturer_sku: &query.manufacturer_sku,
            brand: &query.brand,
            series: &query.series,
            category: &query.category,
            manual_file_name: &query.manual_file_name,
            matched_manual,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NotFoundRow<'a> {
    #[serde(rename = "manufacturerSKU")]
    pub manufacturer_sku: &'a str,
    pub brand: &'a str,
    #[serde(rename = "c__series")]
    pub series: &'a str,
    #[serde(rename = "c__productCategory")]
    pub category: &'a str,
    #[serde(rename = "installationManualFileName(.pdf)")]
    pub manual_file_name: &'a str,
    pub comment: String,
}

impl<'a> NotFoundRow<'a> {
    pub fn new(query: &'a MatchQuery, comment: impl Into<String>) -> Self {
        NotFoundRow {
            manufacturer_sku: &query.manufacturer_sku,
            brand: &query.brand,
            series: &query.series,
            category: &query.category,
            manual_file_name: &query.manual_file_name,
            comment: comment.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ManualType, SkuRecord};

    fn record(sku: &str) -> SkuRecord {
        SkuRecord {
            sku: sku.into(),
            series: String::new(),
            brand: "Empire".into(),
            pdf_name: "DVC.pdf".into(),
            manual_type: ManualType::Installation,
            pdf_location: "Empire/DVC.pdf".into(),
        }
    }

    #[test]
    fn header_written_once_across_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/manifest.csv");
        append_rows(&path, &[record("DVC20IN31N")]).unwrap();
        append_rows(&path, &[record("DVC20IN31P"), record("DVC26IN31N")]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "sku,series,brand,pdf_name,manual_type,pdf_location");
        assert_eq!(lines[1], "DVC20IN31N,,Empire,DVC.pdf,installation,Empire/DVC.pdf");
        assert_eq!(lines.len(), 4);

        let back: Vec<SkuRecord> = read_rows(&path).unwrap();
        assert_eq!(back[2], record("DVC26IN31N"));
    }

    #[test]
    fn empty_append_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("found.csv");
        append_rows::<SkuRecord>(&path, &[]).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn products_table_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manualNames.csv");
        fs::write(
            &path,
            "manufacturerSKU,brand,c__series,c__productCategory,installationManualFileName(.pdf),extra\n\
             DRT3045TEN,Superior,DRT3000,Fireplaces,Superior DRT3045 Install,x\n",
        )
        .unwrap();
        let products: Vec<MatchQuery> = read_rows(&path).unwrap();
        assert_eq!(products[0].manufacturer_sku, "DRT3045TEN");
        assert_eq!(products[0].series, "DRT3000");
        assert_eq!(products[0].manual_file_name, "Superior DRT3045 Install");
    }

    #[test]
    fn result_rows_keep_product_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_found.csv");
        let query = MatchQuery {
            manufacturer_sku: "STFSO18".into(),
            brand: "Superior".into(),
            ..MatchQuery::default()
        };
        append_rows(&path, &[NotFoundRow::new(&query, "Ignored.")]).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "manufacturerSKU,brand,c__series,c__productCategory,installationManualFileName(.pdf),comment\n\
             STFSO18,Superior,,,,Ignored.\n"
        );
    }

    #[test]
    fn destination_name_is_sanitized() {
        let dest = destination_for(
            Path::new("manuals"),
            "Superior",
            "DRT 3045/3545 Install",
            Path::new("data/manuals/Superior/drt.PDF"),
        );
        assert_eq!(dest, PathBuf::from("manuals/Superior/DRT-3045_3545-Install.PDF"));
    }

    #[test]
    fn copy_creates_brand_directory() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.pdf");
        fs::write(&src, b"%PDF-1.4").unwrap();
        let dest = destination_for(&dir.path().join("out"), "Empire", "DVC 20", &src);
        copy_manual(&src, &dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"%PDF-1.4");
        assert!(copy_manual(&dir.path().join("missing.pdf"), &dest).is_err());
    }

    #[test]
    fn remove_missing_file_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("found.csv");
        remove_if_exists(&path).unwrap();
        fs::write(&path, "x").unwrap();
        remove_if_exists(&path).unwrap();
        assert!(!path.exists());
    }
}
