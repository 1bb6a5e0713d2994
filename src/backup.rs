//! Workspace backups.
//!
//! A bundle is a zip holding `manifest.json` and a copy of the workspace
//! database. Restores also take a bare SQLite file. Either way the incoming
//! database is staged next to the live one and only swapped in once it opens
//! cleanly, so a bad input never replaces a working workspace.

use crate::store::{SqliteStore, DB_FILE_NAME};
use anyhow::{anyhow, bail, Context};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const BUNDLE_FORMAT_V1: &str = "gradebook-workspace-v1";
pub const SQLITE_FORMAT: &str = "sqlite3";

const MANIFEST_ENTRY: &str = "manifest.json";
const DB_ENTRY: &str = "db/gradebook.sqlite3";
const SQLITE_MAGIC: &[u8; 16] = b"SQLite format 3\0";
const ZIP_MAGIC: &[u8; 4] = b"PK\x03\x04";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Manifest {
    format: String,
    app_version: String,
    exported_at: String,
    db_sha256: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: &'static str,
    pub entry_count: usize,
    pub db_sha256: String,
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

pub fn export_workspace_bundle(workspace: &Path, out_path: &Path) -> anyhow::Result<ExportSummary> {
    let db_path = workspace.join(DB_FILE_NAME);
    let db_bytes = std::fs::read(&db_path)
        .with_context(|| format!("workspace database not readable: {}", db_path.display()))?;
    let db_sha256 = sha256_hex(&db_bytes);
    let manifest = Manifest {
        format: BUNDLE_FORMAT_V1.to_string(),
        app_version: env!("CARGO_PKG_VERSION").to_string(),
        exported_at: chrono::Utc::now().to_rfc3339(),
        db_sha256: Some(db_sha256.clone()),
    };

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let out = File::create(out_path)
        .with_context(|| format!("failed to create {}", out_path.display()))?;
    write_bundle(out, &manifest, &db_bytes).context("failed to write bundle")?;

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1,
        entry_count: 2,
        db_sha256,
    })
}

fn write_bundle(out: File, manifest: &Manifest, db_bytes: &[u8]) -> anyhow::Result<()> {
    let mut zip = ZipWriter::new(out);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(MANIFEST_ENTRY, opts)?;
    zip.write_all(&serde_json::to_vec_pretty(manifest)?)?;
    zip.start_file(DB_ENTRY, opts)?;
    zip.write_all(db_bytes)?;
    zip.finish()?;
    Ok(())
}

/// A verified database waiting next to the live workspace file. Dropping it
/// without [`StagedImport::commit`] removes the staged copy.
#[derive(Debug)]
pub struct StagedImport {
    path: PathBuf,
    target: PathBuf,
    format_detected: &'static str,
}

impl StagedImport {
    /// Moves the staged database over the workspace file. Any connection to
    /// that file must already be closed.
    pub fn commit(self) -> anyhow::Result<&'static str> {
        std::fs::rename(&self.path, &self.target)
            .with_context(|| format!("failed to replace {}", self.target.display()))?;
        Ok(self.format_detected)
    }
}

impl Drop for StagedImport {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Reads a bundle or bare SQLite file and stages it for `workspace`.
/// Nothing in the workspace changes until the result is committed.
pub fn stage_import(in_path: &Path, workspace: &Path) -> anyhow::Result<StagedImport> {
    let mut header = [0u8; 16];
    let read = File::open(in_path)
        .and_then(|mut f| f.read(&mut header))
        .with_context(|| format!("failed to read {}", in_path.display()))?;
    let header = &header[..read];

    let (format_detected, db_bytes) = if header.starts_with(ZIP_MAGIC) {
        (BUNDLE_FORMAT_V1, read_bundle(in_path)?)
    } else if header.starts_with(SQLITE_MAGIC) {
        let bytes = std::fs::read(in_path)
            .with_context(|| format!("failed to read {}", in_path.display()))?;
        (SQLITE_FORMAT, bytes)
    } else {
        bail!("{} is neither a backup bundle nor a SQLite database", in_path.display());
    };

    std::fs::create_dir_all(workspace)
        .with_context(|| format!("failed to create workspace {}", workspace.display()))?;
    let staged = StagedImport {
        path: workspace.join(format!("{DB_FILE_NAME}.importing")),
        target: workspace.join(DB_FILE_NAME),
        format_detected,
    };
    std::fs::write(&staged.path, &db_bytes)
        .with_context(|| format!("failed to write {}", staged.path.display()))?;
    SqliteStore::check_file(&staged.path).context("backup database rejected")?;
    Ok(staged)
}

fn read_bundle(path: &Path) -> anyhow::Result<Vec<u8>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut archive = ZipArchive::new(file).context("invalid zip archive")?;

    let manifest: Manifest = {
        let entry = archive
            .by_name(MANIFEST_ENTRY)
            .context("bundle missing manifest.json")?;
        serde_json::from_reader(entry).context("manifest.json is invalid")?
    };
    if manifest.format != BUNDLE_FORMAT_V1 {
        bail!("unsupported bundle format: {:?}", manifest.format);
    }
    let expected = manifest
        .db_sha256
        .ok_or_else(|| anyhow!("manifest has no dbSha256 checksum"))?;

    let mut db_bytes = Vec::new();
    archive
        .by_name(DB_ENTRY)
        .with_context(|| format!("bundle missing {DB_ENTRY}"))?
        .read_to_end(&mut db_bytes)
        .context("failed to extract database entry")?;

    let actual = sha256_hex(&db_bytes);
    if !actual.eq_ignore_ascii_case(&expected) {
        bail!("database checksum mismatch: manifest {expected}, bundle {actual}");
    }
    Ok(db_bytes)
}
