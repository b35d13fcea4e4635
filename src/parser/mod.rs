pub mod brands;
pub mod normalize;
pub mod variants;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;
use crate::pdf::TextBlockSource;
use brands::Brand;

/// Installation guide or owner's guide. Variant order follows the lexical
/// order of the serialized names ("" < "installation" < "owner"), which is
/// the preference order used when ranking matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ManualType {
    #[default]
    Unknown,
    Installation,
    Owner,
}

impl ManualType {
    /// Classify a detected word such as "installation", "installer", "owner"
    /// or "owner's".
    pub fn from_word(word: &str) -> Self {
        let lower = word.trim().to_lowercase();
        if lower.starts_with("install") {
            ManualType::Installation
        } else if lower.starts_with("owner") {
            ManualType::Owner
        } else {
            ManualType::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ManualType::Unknown => "",
            ManualType::Installation => "installation",
            ManualType::Owner => "owner",
        }
    }
}

impl From<String> for ManualType {
    fn from(s: String) -> Self {
        ManualType::from_word(&s)
    }
}

impl From<ManualType> for String {
    fn from(t: ManualType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for ManualType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One SKU found in one manual. Field names are the manifest columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuRecord {
    pub sku: String,
    #[serde(default)]
    pub series: String,
    pub brand: String,
    #[serde(default)]
    pub pdf_name: String,
    #[serde(default)]
    pub manual_type: ManualType,
    pub pdf_location: String,
}

/// A manual file inside the corpus, `<root>/<brand>/<file>.pdf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualDocument {
    pub path: PathBuf,
    pub brand: String,
    pub pdf_name: String,
    /// Path relative to the corpus root, `/`-separated.
    pub location: String,
}

impl ManualDocument {
    pub fn new(root: &Path, path: &Path) -> Result<Self, ExtractError> {
        let relative = path
            .strip_prefix(root)
            .map_err(|_| ExtractError::BadLocation(path.to_path_buf()))?;
        let brand = path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ExtractError::BadLocation(path.to_path_buf()))?;
        let pdf_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ExtractError::BadLocation(path.to_path_buf()))?;
        let location = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        Ok(ManualDocument {
            path: path.to_path_buf(),
            brand,
            pdf_name,
            location,
        })
    }

    /// File name without its extension.
    pub fn stem(&self) -> &str {
        self.pdf_name
            .rsplit_once('.')
            .map_or(self.pdf_name.as_str(), |(stem, _)| stem)
    }

    pub fn record(&self, sku: &str, series: &str, manual_type: ManualType) -> SkuRecord {
        SkuRecord {
            sku: sku.to_string(),
            series: series.to_string(),
            brand: self.brand.clone(),
            pdf_name: self.pdf_name.clone(),
            manual_type,
            pdf_location: self.location.clone(),
        }
    }
}

/// Run the strategy registered for the document's brand directory.
pub fn extract_document(
    doc: &ManualDocument,
    source: &dyn TextBlockSource,
) -> Result<Vec<SkuRecord>, ExtractError> {
    Brand::from_name(&doc.brand).extract(doc, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::FixedSource;

    fn doc(brand: &str, name: &str) -> ManualDocument {
        let root = Path::new("/corpus");
        ManualDocument::new(root, &root.join(brand).join(name)).unwrap()
    }

    #[test]
    fn document_location_is_relative() {
        let d = doc("Empire", "DVCX3642FP91-3.pdf");
        assert_eq!(d.brand, "Empire");
        assert_eq!(d.pdf_name, "DVCX3642FP91-3.pdf");
        assert_eq!(d.location, "Empire/DVCX3642FP91-3.pdf");
        assert_eq!(d.stem(), "DVCX3642FP91-3");
    }

    #[test]
    fn document_outside_root_is_rejected() {
        let err = ManualDocument::new(Path::new("/corpus"), Path::new("/elsewhere/Empire/a.pdf"))
            .unwrap_err();
        assert!(matches!(err, ExtractError::BadLocation(_)));
    }

    #[test]
    fn manual_type_order_prefers_installation() {
        assert!(ManualType::Installation < ManualType::Owner);
        assert!(ManualType::Unknown < ManualType::Installation);
        assert_eq!(ManualType::from_word("installer"), ManualType::Installation);
        assert_eq!(ManualType::from_word("owner"), ManualType::Owner);
        assert_eq!(ManualType::from_word(""), ManualType::Unknown);
    }

    #[test]
    fn curated_owner_spellings() {
        assert_eq!(ManualType::from_word("owners"), ManualType::Owner);
        assert_eq!(ManualType::from_word("Owner's"), ManualType::Owner);
        assert_eq!(ManualType::from("OWNER'S MANUAL".to_string()), ManualType::Owner);
        assert_eq!(ManualType::from_word("service"), ManualType::Unknown);
    }

    #[test]
    fn unknown_brand_is_an_error() {
        let source = FixedSource::page_one(&["Models: ABC123"]);
        let err = extract_document(&doc("Acme", "a.pdf"), &source).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedBrand(b) if b == "Acme"));
    }

    #[test]
    fn dispatch_by_brand_directory() {
        let source = FixedSource::page_one(&["Models: XLF100, XLF74"]);
        let records = extract_document(&doc("Dimplex", "XLF100_Dimplex.pdf"), &source).unwrap();
        let skus: Vec<_> = records.iter().map(|r| r.sku.as_str()).collect();
        assert_eq!(skus, vec!["XLF100", "XLF74"]);
    }
}
