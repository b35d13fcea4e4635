use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::StoreError;
use crate::parser::SkuRecord;
use crate::store;

/// Manifest records grouped by brand. Within a brand, records keep the order
/// they were read in; the matcher relies on it to break score ties.
#[derive(Debug, Default)]
pub struct Catalog {
    groups: HashMap<String, Vec<SkuRecord>>,
}

impl Catalog {
    pub fn from_records(records: impl IntoIterator<Item = SkuRecord>) -> Self {
        let mut groups: HashMap<String, Vec<SkuRecord>> = HashMap::new();
        for record in records {
            groups.entry(record.brand.clone()).or_default().push(record);
        }
        Catalog { groups }
    }

    /// Read one or more manifest CSVs, in order, into a single catalog.
    pub fn load(paths: &[PathBuf]) -> Result<Self, StoreError> {
        let mut records = Vec::new();
        for path in paths {
            records.extend(store::read_rows::<SkuRecord>(path)?);
        }
        Ok(Catalog::from_records(records))
    }

    /// Records for a brand; `None` when the brand has none.
    pub fn brand(&self, brand: &str) -> Option<&[SkuRecord]> {
        self.groups
            .get(brand)
            .map(Vec::as_slice)
            .filter(|records| !records.is_empty())
    }

    pub fn brands(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::parser::ManualType;

    fn record(sku: &str, brand: &str, location: &str) -> SkuRecord {
        SkuRecord {
            sku: sku.into(),
            series: String::new(),
            brand: brand.into(),
            pdf_name: location.rsplit('/').next().unwrap_or_default().into(),
            manual_type: ManualType::Unknown,
            pdf_location: location.into(),
        }
    }

    #[test]
    fn groups_keep_read_order() {
        let catalog = Catalog::from_records([
            record("B2", "Empire", "Empire/b.pdf"),
            record("X1", "Superior", "Superior/x.pdf"),
            record("A1", "Empire", "Empire/a.pdf"),
        ]);
        let empire: Vec<_> = catalog.brand("Empire").unwrap().iter().map(|r| r.sku.as_str()).collect();
        assert_eq!(empire, vec!["B2", "A1"]);
        assert_eq!(catalog.len(), 3);
        assert!(catalog.brand("Napoleon").is_none());
        assert!(catalog.brand("").is_none());
    }

    #[test]
    fn load_merges_manifests() {
        let dir = tempfile::tempdir().unwrap();
        let main = dir.path().join("manifest.csv");
        let extra = dir.path().join("manifest_napoleon.csv");
        fs::write(
            &main,
            "sku,series,brand,pdf_name,manual_type,pdf_location\n\
             DVC20IN31N,,Empire,DVC.pdf,installation,Empire/DVC.pdf\n",
        )
        .unwrap();
        // curated manifests may omit optional columns
        fs::write(
            &extra,
            "sku,brand,pdf_location\nGX70NTE-1,Napoleon,Napoleon/Ascent-X-70-Series-Manual.pdf\n",
        )
        .unwrap();

        let catalog = Catalog::load(&[main, extra]).unwrap();
        assert_eq!(catalog.len(), 2);
        let empire = &catalog.brand("Empire").unwrap()[0];
        assert_eq!(empire.manual_type, ManualType::Installation);
        let napoleon = &catalog.brand("Napoleon").unwrap()[0];
        assert_eq!(napoleon.series, "");
        assert_eq!(napoleon.pdf_location, "Napoleon/Ascent-X-70-Series-Manual.pdf");
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Catalog::load(&[dir.path().join("nope.csv")]).unwrap_err();
        assert!(matches!(err, StoreError::Csv { .. }));
    }
}
