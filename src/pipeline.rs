//! Batch orchestration: manifest building and product matching.
//!
//! Work fans out per chunk on a bounded rayon pool; results come back to the
//! calling thread, which is the only one writing files.

use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use rayon::ThreadPool;
use serde_json::json;
use tracing::{error, info, warn};

use crate::catalog::Catalog;
use crate::error::ExtractError;
use crate::matcher::{find_match, MatchOutcome, MatchQuery};
use crate::parser::{extract_document, ManualDocument, SkuRecord};
use crate::pdf::TextBlockSource;
use crate::settings::Settings;
use crate::store::{self, FoundRow, NotFoundRow};

const IGNORED_COMMENT: &str = "Ignored.";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ManifestStats {
    pub files: usize,
    pub records: usize,
    pub errors: usize,
    /// Rows merged in from the curated manifests.
    pub appended: usize,
}

impl ManifestStats {
    pub fn print(&self) {
        println!(
            "Extracted {} SKU records from {} manuals ({} errors), appended {} curated rows.",
            self.records, self.files, self.errors, self.appended,
        );
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct FindStats {
    pub total: usize,
    pub found: usize,
    pub not_found: usize,
    pub ignored: usize,
    pub errors: usize,
}

impl FindStats {
    pub fn print(&self) {
        println!(
            "Matched {} of {} products ({} not found, {} ignored, {} errors).",
            self.found, self.total, self.not_found, self.ignored, self.errors,
        );
    }
}

fn worker_pool(size: usize) -> Result<ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(size.max(1))
        .build()
        .context("Failed to build worker pool")
}

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Every `*.pdf` under `root`, sorted. Files whose brand directory is in
/// `skip_brands` are left out; a non-empty `only` keeps just those brands.
pub fn collect_manuals(root: &Path, only: &[String], settings: &Settings) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_pdf_files(root, &mut files).with_context(|| format!("Failed to list {}", root.display()))?;

    files.retain(|path| {
        let brand = brand_dir(path);
        !settings.is_skipped(brand) && (only.is_empty() || only.iter().any(|b| b == brand))
    });
    files.sort();
    Ok(files)
}

fn collect_pdf_files(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_pdf_files(&path, out)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("pdf") {
            out.push(path);
        }
    }
    Ok(())
}

fn brand_dir(path: &Path) -> &str {
    path.parent()
        .and_then(Path::file_name)
        .and_then(|n| n.to_str())
        .unwrap_or_default()
}

/// Run one work item; a panic comes back as its message instead of
/// unwinding through the worker pool.
fn isolate<T>(work: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(work)).map_err(|payload| panic_message(payload.as_ref()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn extract_file(root: &Path, path: &Path, source: &dyn TextBlockSource) -> Result<Vec<SkuRecord>, ExtractError> {
    isolate(|| -> Result<_, ExtractError> {
        let doc = ManualDocument::new(root, path)?;
        extract_document(&doc, source)
    })
    .unwrap_or_else(|msg| Err(ExtractError::Panicked(msg)))
}

/// Scan the corpus and write a fresh manifest, then merge in the curated
/// manifests of brands that are not scanned.
pub fn build_manifest(
    settings: &Settings,
    only: &[String],
    sequential: bool,
    source: &dyn TextBlockSource,
) -> Result<ManifestStats> {
    store::remove_if_exists(&settings.manifest_path)?;

    let files = collect_manuals(&settings.manuals_dir, only, settings)?;
    info!("Extracting SKUs from {} manuals in {}", files.len(), settings.manuals_dir.display());

    let pool = if sequential { None } else { Some(worker_pool(settings.pool_size)?) };
    let pb = progress_bar(files.len())?;
    let mut stats = ManifestStats {
        files: files.len(),
        ..ManifestStats::default()
    };

    let root = settings.manuals_dir.as_path();
    for chunk in files.chunks(settings.chunk_size.max(1)) {
        let extract = |path: &PathBuf| extract_file(root, path, source);
        let results: Vec<_> = match &pool {
            Some(pool) => pool.install(|| chunk.par_iter().map(extract).collect()),
            None => chunk.iter().map(extract).collect(),
        };

        for (path, result) in chunk.iter().zip(results) {
            match result {
                Ok(records) => {
                    stats.records += records.len();
                    store::append_rows(&settings.manifest_path, &records)?;
                }
                Err(ExtractError::UnsupportedBrand(brand)) => {
                    warn!(file = %path.display(), "no extraction strategy for brand {brand:?}");
                    stats.errors += 1;
                }
                Err(e) => {
                    error!(file = %path.display(), "{e}");
                    stats.errors += 1;
                }
            }
        }
        pb.inc(chunk.len() as u64);
    }
    pb.finish_and_clear();

    stats.appended = append_curated_manifests(settings)?;
    info!(
        "Manifest written to {} ({} records)",
        settings.manifest_path.display(),
        stats.records + stats.appended
    );
    Ok(stats)
}

/// Missing curated manifests are skipped with a warning.
fn append_curated_manifests(settings: &Settings) -> Result<usize> {
    let mut appended = 0;
    for path in &settings.extra_manifests {
        if !path.exists() {
            warn!("Curated manifest {} not found, skipping", path.display());
            continue;
        }
        let records: Vec<SkuRecord> = store::read_rows(path)?;
        store::append_rows(&settings.manifest_path, &records)?;
        appended += records.len();
    }
    Ok(appended)
}

/// Match every product against the manifest, copy the chosen manuals and
/// write the found / not-found tables.
pub fn find_manuals(settings: &Settings, sequential: bool) -> Result<FindStats> {
    let found_log = settings.found_log();
    let not_found_log = settings.not_found_log();
    store::remove_if_exists(&found_log)?;
    store::remove_if_exists(&not_found_log)?;

    let products: Vec<MatchQuery> = store::read_rows(&settings.products_path)?;
    let catalog = Catalog::load(std::slice::from_ref(&settings.manifest_path))?;
    info!(
        "Matching {} products against {} manifest records ({} brands)",
        products.len(),
        catalog.len(),
        catalog.brands().count()
    );
    if catalog.is_empty() {
        warn!("Manifest {} has no records; run `manifest` first", settings.manifest_path.display());
    }

    let policy = settings.match_policy();
    let pool = if sequential { None } else { Some(worker_pool(settings.pool_size)?) };
    let pb = progress_bar(products.len())?;
    let mut stats = FindStats {
        total: products.len(),
        ..FindStats::default()
    };

    for chunk in products.chunks(settings.chunk_size.max(1)) {
        let resolve = |query: &MatchQuery| isolate(|| find_match(query, &catalog, &policy));
        let outcomes: Vec<Result<MatchOutcome, String>> = match &pool {
            Some(pool) => pool.install(|| chunk.par_iter().map(resolve).collect()),
            None => chunk.iter().map(resolve).collect(),
        };

        let mut found = Vec::new();
        let mut not_found = Vec::new();
        for (query, outcome) in chunk.iter().zip(&outcomes) {
            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(msg) => {
                    error!(sku = %query.manufacturer_sku, "matching panicked: {msg}");
                    stats.errors += 1;
                    not_found.push(NotFoundRow::new(query, format!("Matching failed: {msg}")));
                    continue;
                }
            };
            match outcome {
                MatchOutcome::Ignored => {
                    stats.ignored += 1;
                    not_found.push(NotFoundRow::new(query, IGNORED_COMMENT));
                }
                MatchOutcome::NotFound(reason) => {
                    stats.not_found += 1;
                    not_found.push(NotFoundRow::new(query, reason.comment()));
                }
                MatchOutcome::Found(candidates) => {
                    let record = candidates[0].record;
                    let manual = settings.manuals_dir.join(&record.pdf_location);
                    let destination = store::destination_for(
                        &settings.output_dir,
                        &query.brand,
                        &query.manual_file_name,
                        &manual,
                    );
                    match store::copy_manual(&manual, &destination) {
                        Ok(()) => {
                            stats.found += 1;
                            found.push(FoundRow::new(query, &record.pdf_location));
                        }
                        Err(e) => {
                            error!(sku = %query.manufacturer_sku, "{e}");
                            stats.errors += 1;
                            not_found.push(NotFoundRow::new(query, format!("Failed to copy manual: {e}")));
                        }
                    }
                }
            }
        }

        store::append_rows(&found_log, &found)?;
        store::append_rows(&not_found_log, &not_found)?;
        pb.inc(chunk.len() as u64);
    }
    pb.finish_and_clear();

    Ok(stats)
}

/// Ranked candidates for a single product, as JSON.
pub fn lookup(settings: &Settings, query: &MatchQuery) -> Result<serde_json::Value> {
    let catalog = Catalog::load(std::slice::from_ref(&settings.manifest_path))?;
    let outcome = find_match(query, &catalog, &settings.match_policy());

    let value = match &outcome {
        MatchOutcome::Ignored => json!({ "status": "ignored", "comment": IGNORED_COMMENT }),
        MatchOutcome::NotFound(reason) => json!({ "status": "not_found", "comment": reason.comment() }),
        MatchOutcome::Found(candidates) => json!({
            "status": "found",
            "manual": outcome.manual_path(&settings.manuals_dir),
            "candidates": candidates,
        }),
    };
    Ok(value)
}
