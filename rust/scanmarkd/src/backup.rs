use anyhow::{anyhow, Context};
use rusqlite::Connection;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const DB_ENTRY: &str = "db/scanmark.sqlite3";
const DB_FILE_NAME: &str = "scanmark.sqlite3";
pub const BUNDLE_FORMAT_V1: &str = "scanmark-workspace-v1";
pub const RAW_SQLITE_FORMAT: &str = "raw-sqlite3";
const SQLITE_HEADER: &[u8; 16] = b"SQLite format 3\0";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
    pub db_sha256: String,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

pub fn export_workspace_bundle(
    workspace_path: &Path,
    out_path: &Path,
) -> anyhow::Result<ExportSummary> {
    let db_path = workspace_path.join(DB_FILE_NAME);
    if !db_path.is_file() {
        return Err(anyhow!(
            "workspace database not found: {}",
            db_path.to_string_lossy()
        ));
    }
    let db_bytes = std::fs::read(&db_path)
        .with_context(|| format!("failed to read database {}", db_path.to_string_lossy()))?;
    let db_sha256 = sha256_hex(&db_bytes);

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let exported_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": exported_at,
        "dbSha256": db_sha256,
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    zip.start_file(DB_ENTRY, opts)
        .context("failed to start database entry")?;
    zip.write_all(&db_bytes)
        .context("failed to write database entry")?;

    zip.finish().context("failed to finalize zip bundle")?;

    tracing::info!(out = %out_path.display(), "workspace bundle exported");
    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: 2,
        db_sha256,
    })
}

/// Restores a bundle (or a bare SQLite file) into `workspace_path`.
///
/// The database is written to a temp file, opened, integrity-checked and
/// handed to `prepare` (schema setup for the caller). It is renamed over the
/// current database only when all of that succeeds, so a bad input never
/// replaces the workspace.
pub fn import_workspace_bundle<F>(
    in_path: &Path,
    workspace_path: &Path,
    prepare: F,
) -> anyhow::Result<ImportSummary>
where
    F: Fn(&Connection) -> anyhow::Result<()>,
{
    std::fs::create_dir_all(workspace_path).with_context(|| {
        format!(
            "failed to create workspace {}",
            workspace_path.to_string_lossy()
        )
    })?;
    let dst = workspace_path.join(DB_FILE_NAME);

    if !is_zip_file(in_path)? {
        let bytes = std::fs::read(in_path)
            .with_context(|| format!("failed to read {}", in_path.to_string_lossy()))?;
        replace_db(workspace_path, &dst, &bytes, &prepare)?;
        tracing::info!(src = %in_path.display(), "raw sqlite file imported");
        return Ok(ImportSummary {
            bundle_format_detected: RAW_SQLITE_FORMAT.to_string(),
        });
    }

    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: serde_json::Value =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        return Err(anyhow!("unsupported bundle format: {}", format));
    }
    let expected_sha = manifest
        .get("dbSha256")
        .and_then(|v| v.as_str())
        .context("manifest.json missing dbSha256")?
        .to_string();

    let mut db_bytes = Vec::new();
    archive
        .by_name(DB_ENTRY)
        .context("bundle missing db/scanmark.sqlite3")?
        .read_to_end(&mut db_bytes)
        .context("failed to extract database entry")?;
    let actual_sha = sha256_hex(&db_bytes);
    if actual_sha != expected_sha {
        return Err(anyhow!(
            "database checksum mismatch: manifest {}, entry {}",
            expected_sha,
            actual_sha
        ));
    }

    replace_db(workspace_path, &dst, &db_bytes, &prepare)?;
    tracing::info!(src = %in_path.display(), "workspace bundle imported");
    Ok(ImportSummary {
        bundle_format_detected: BUNDLE_FORMAT_V1.to_string(),
    })
}

fn replace_db<F>(workspace_path: &Path, dst: &Path, bytes: &[u8], prepare: &F) -> anyhow::Result<()>
where
    F: Fn(&Connection) -> anyhow::Result<()>,
{
    if !bytes.starts_with(SQLITE_HEADER) {
        return Err(anyhow!("input is not a SQLite database"));
    }

    let tmp_dst = workspace_path.join(format!("{}.importing", DB_FILE_NAME));
    if tmp_dst.exists() {
        let _ = std::fs::remove_file(&tmp_dst);
    }
    let mut out = File::create(&tmp_dst).with_context(|| {
        format!(
            "failed to create temp database {}",
            tmp_dst.to_string_lossy()
        )
    })?;
    out.write_all(bytes)
        .context("failed to write extracted database")?;
    out.sync_all().context("failed to flush extracted database")?;
    drop(out);

    if let Err(e) = check_database(&tmp_dst, prepare) {
        let _ = std::fs::remove_file(&tmp_dst);
        return Err(e);
    }

    std::fs::rename(&tmp_dst, dst).with_context(|| {
        format!(
            "failed to move extracted database to {}",
            dst.to_string_lossy()
        )
    })?;
    Ok(())
}

fn check_database<F>(path: &Path, prepare: &F) -> anyhow::Result<()>
where
    F: Fn(&Connection) -> anyhow::Result<()>,
{
    let conn = Connection::open(path).context("failed to open imported database")?;
    let verdict: String = conn
        .query_row("PRAGMA quick_check", [], |r| r.get(0))
        .context("imported database failed integrity check")?;
    if verdict != "ok" {
        return Err(anyhow!("imported database is damaged: {}", verdict));
    }
    prepare(&conn).context("imported database is not a usable workspace")?;
    conn.close()
        .map_err(|(_, e)| e)
        .context("failed to close imported database")?;
    Ok(())
}

fn is_zip_file(path: &Path) -> anyhow::Result<bool> {
    let mut f = File::open(path)
        .with_context(|| format!("failed to open input file {}", path.to_string_lossy()))?;
    let mut sig = [0u8; 4];
    let read = f.read(&mut sig).context("failed to read file signature")?;
    if read < 4 {
        return Ok(false);
    }
    Ok(sig == [0x50, 0x4B, 0x03, 0x04])
}
