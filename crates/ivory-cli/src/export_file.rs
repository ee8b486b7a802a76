//! Reading and writing export documents on disk.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use ivory_core::RunExport;

/// Prefix used for multi-category runs.
pub(crate) const DEFAULT_PREFIX: &str = "ivory_products";

/// Paths written by [`write_export`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WrittenExport {
    pub timestamped: PathBuf,
    pub latest: PathBuf,
}

/// Writes `export` as `<prefix>_<YYYY-MM-DDTHH-MM-SS>.json` under `dir`
/// and refreshes `<prefix>_latest.json` with the same content.
pub(crate) fn write_export(
    dir: &Path,
    prefix: &str,
    export: &RunExport,
) -> anyhow::Result<WrittenExport> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let stamp = export.capture_date.format("%Y-%m-%dT%H-%M-%S");
    let timestamped = dir.join(format!("{prefix}_{stamp}.json"));
    let latest = dir.join(format!("{prefix}_latest.json"));

    write_json(&timestamped, export)?;
    fs::copy(&timestamped, &latest)
        .with_context(|| format!("failed to update {}", latest.display()))?;

    Ok(WrittenExport {
        timestamped,
        latest,
    })
}

pub(crate) fn write_json(path: &Path, export: &RunExport) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(export).context("failed to serialize export")?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

pub(crate) fn read_export(path: &Path) -> anyhow::Result<RunExport> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not a valid export document", path.display()))
}

/// `<dir>/<stem>_verified.json` next to `input`.
pub(crate) fn verified_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "export".into(), |s| s.to_string_lossy());
    input.with_file_name(format!("{stem}_verified.json"))
}
