use crate::error::PrefillerError;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

/// Latest schema export found in a version directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaFile {
    pub version: u64,
    pub path: PathBuf,
}

/// Find the `<version>.json` file with the highest version in `dir`.
///
/// Equal versions (`2.json` vs `02.json`) resolve to the lexicographically
/// greatest file name.
pub fn find_latest(dir: &Path) -> Result<SchemaFile, PrefillerError> {
    if !dir.is_dir() {
        return Err(PrefillerError::schema_not_found(
            dir,
            "'schemaDirectory' does not exist or is not a directory",
        ));
    }

    let entries = fs::read_dir(dir).map_err(|e| PrefillerError::schema_not_found(dir, e))?;

    let latest = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to read schema dir entry");
                None
            }
        })
        .filter(|path| path.is_file())
        .filter_map(|path| schema_version(&path).map(|version| SchemaFile { version, path }))
        .max_by(|a, b| {
            a.version
                .cmp(&b.version)
                .then_with(|| a.path.file_name().cmp(&b.path.file_name()))
        })
        .ok_or_else(|| PrefillerError::schema_not_found(dir, "no <version>.json schema files"))?;

    debug!(
        path = %latest.path.display(),
        version = latest.version,
        "resolved latest schema export"
    );
    Ok(latest)
}

fn schema_version(path: &Path) -> Option<u64> {
    let is_json = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        == Some(true);
    if !is_json {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}
