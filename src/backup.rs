use crate::config::CONFIG_FILE;
use crate::db::DB_FILE;
use crate::store::ROSTER_FILES;
use anyhow::{anyhow, Context};
use serde_json::json;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
pub const BUNDLE_FORMAT_V1: &str = "schoold-workspace-v1";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
    pub restored: Vec<String>,
}

/// Workspace files carried by a bundle, as `(entry name, file name)`.
fn bundle_entries() -> Vec<(String, &'static str)> {
    let mut out: Vec<(String, &'static str)> = ROSTER_FILES
        .iter()
        .map(|f| (format!("roster/{f}"), *f))
        .collect();
    out.push((CONFIG_FILE.to_string(), CONFIG_FILE));
    out.push((format!("db/{DB_FILE}"), DB_FILE));
    out
}

pub fn export_workspace_bundle(
    workspace_path: &Path,
    out_path: &Path,
) -> anyhow::Result<ExportSummary> {
    if !workspace_path.is_dir() {
        return Err(anyhow!(
            "workspace not found: {}",
            workspace_path.to_string_lossy()
        ));
    }

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

    let present: Vec<(String, &'static str)> = bundle_entries()
        .into_iter()
        .filter(|(_, file)| workspace_path.join(file).is_file())
        .collect();

    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": chrono::Utc::now().to_rfc3339(),
        "entries": present.iter().map(|(entry, _)| entry.as_str()).collect::<Vec<_>>(),
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    for (entry, file) in &present {
        let src = workspace_path.join(file);
        zip.start_file(entry.as_str(), opts)
            .with_context(|| format!("failed to start entry {entry}"))?;
        let mut f = File::open(&src)
            .with_context(|| format!("failed to open {}", src.to_string_lossy()))?;
        std::io::copy(&mut f, &mut zip).with_context(|| format!("failed to write entry {entry}"))?;
    }

    zip.finish().context("failed to finalize zip bundle")?;

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: present.len() + 1,
    })
}

pub fn import_workspace_bundle(
    in_path: &Path,
    workspace_path: &Path,
) -> anyhow::Result<ImportSummary> {
    if !is_zip_file(in_path)? {
        return Err(anyhow!(
            "not a workspace bundle: {}",
            in_path.to_string_lossy()
        ));
    }
    std::fs::create_dir_all(workspace_path).with_context(|| {
        format!(
            "failed to create workspace {}",
            workspace_path.to_string_lossy()
        )
    })?;

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

    let listed: Vec<&str> = manifest
        .get("entries")
        .and_then(|v| v.as_array())
        .ok_or_else(|| anyhow!("manifest.json has no entries list"))?
        .iter()
        .filter_map(|v| v.as_str())
        .collect();

    // Extract everything first so a truncated bundle leaves the workspace untouched.
    let mut staged: Vec<(PathBuf, PathBuf, String)> = Vec::new();
    let mut absent: Vec<PathBuf> = Vec::new();
    if let Err(e) = stage_entries(
        &mut archive,
        workspace_path,
        &listed,
        &mut staged,
        &mut absent,
    ) {
        for (tmp, _, _) in &staged {
            let _ = std::fs::remove_file(tmp);
        }
        return Err(e);
    }

    // The bundle is the whole workspace: files it does not carry go away.
    for dst in absent {
        if dst.exists() {
            std::fs::remove_file(&dst).with_context(|| {
                format!("failed to remove stale {}", dst.to_string_lossy())
            })?;
        }
    }

    let mut restored = Vec::with_capacity(staged.len());
    for (tmp, dst, entry) in staged {
        if dst.exists() {
            std::fs::remove_file(&dst).with_context(|| {
                format!("failed to remove existing {}", dst.to_string_lossy())
            })?;
        }
        std::fs::rename(&tmp, &dst)
            .with_context(|| format!("failed to move extracted file to {}", dst.to_string_lossy()))?;
        restored.push(entry);
    }

    Ok(ImportSummary {
        bundle_format_detected: BUNDLE_FORMAT_V1.to_string(),
        restored,
    })
}

/// Writes each listed entry to `<file>.importing` and records workspace files
/// the manifest does not list. Every staged path is pushed before it is
/// written so the caller can clean up after a failure.
fn stage_entries(
    archive: &mut ZipArchive<File>,
    workspace_path: &Path,
    listed: &[&str],
    staged: &mut Vec<(PathBuf, PathBuf, String)>,
    absent: &mut Vec<PathBuf>,
) -> anyhow::Result<()> {
    for (entry, file) in bundle_entries() {
        let dst = workspace_path.join(file);
        if !listed.contains(&entry.as_str()) {
            absent.push(dst);
            continue;
        }
        let mut zf = archive
            .by_name(&entry)
            .with_context(|| format!("bundle is missing listed entry {entry}"))?;
        let tmp = workspace_path.join(format!("{file}.importing"));
        staged.push((tmp.clone(), dst, entry.clone()));
        let mut out = File::create(&tmp)
            .with_context(|| format!("failed to create {}", tmp.to_string_lossy()))?;
        std::io::copy(&mut zf, &mut out).with_context(|| format!("failed to extract {entry}"))?;
        out.flush()
            .with_context(|| format!("failed to flush {}", tmp.to_string_lossy()))?;
    }
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
