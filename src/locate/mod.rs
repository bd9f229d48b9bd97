//! Source file discovery. The downloader drops per-country exports under a
//! root directory (`<Country>_..._<date>`); this module finds the latest one
//! per country and pulls the reporting date out of the filename.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

use anyhow::{Context, Result};
use glob::glob;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::map::Country;

/// Recursively enumerate `root` and pick, per country, the most recently
/// modified file whose name starts with `<Country>_` (capitalized, lower- or
/// uppercase). Countries with no match are simply absent from the result;
/// ties on the modification timestamp are implementation-defined but stable
/// within one run.
pub fn find_country_files(root: &Path) -> Result<BTreeMap<Country, PathBuf>> {
    info!(root = %root.display(), "recursively scanning for country files");

    let pattern = format!("{}/**/*", root.display());
    let mut candidates: BTreeMap<Country, Vec<(SystemTime, PathBuf)>> = BTreeMap::new();

    for entry in glob(&pattern).context("invalid glob pattern for find_country_files")? {
        let path = match entry {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "cannot read directory entry");
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        for country in Country::ALL {
            let base = country.name();
            let prefixes = [
                format!("{}_", base),
                format!("{}_", base.to_lowercase()),
                format!("{}_", base.to_uppercase()),
            ];
            if prefixes.iter().any(|p| name.starts_with(p.as_str())) {
                let modified = match fs::metadata(&path).and_then(|m| m.modified()) {
                    Ok(t) => t,
                    Err(e) => {
                        warn!(file = %path.display(), error = %e, "cannot read mtime");
                        continue;
                    }
                };
                debug!(country = %country, file = %path.display(), "candidate file");
                candidates.entry(country).or_default().push((modified, path.clone()));
                break;
            }
        }
    }

    let mut selected = BTreeMap::new();
    for (country, mut files) in candidates {
        if files.len() > 1 {
            info!(country = %country, count = files.len(), "multiple files found, using most recent");
        }
        files.sort_by_key(|(mtime, _)| *mtime);
        if let Some((_, path)) = files.pop() {
            info!(country = %country, file = %path.display(), "selected");
            selected.insert(country, path);
        }
    }

    for country in Country::ALL {
        if !selected.contains_key(&country) {
            warn!(country = %country, root = %root.display(), "no source file found");
        }
    }
    Ok(selected)
}

static FILENAME_DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(\d{4}-\d{2}-\d{2})", // 2025-08-31
        r"(\d{8})",             // 20250831
        r"(\d{2}-\d{2}-\d{4})", // 31-08-2025
        r"(\d{2}/\d{2}/\d{4})", // 31/08/2025
        r"(\d{4}_\d{2}_\d{2})", // 2025_08_31
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Pull a `YYYY-MM` reporting date out of a downloaded filename. The five
/// recognized layouts are the ones the downloader has produced historically.
pub fn extract_date_from_filename(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;

    for (i, pattern) in FILENAME_DATE_PATTERNS.iter().enumerate() {
        let Some(m) = pattern.captures(name).map(|c| c[1].to_string()) else {
            continue;
        };
        debug!(file = %name, date = %m, "date found in filename");
        let normalized = match i {
            0 => m[..7].to_string(),
            1 => format!("{}-{}", &m[..4], &m[4..6]),
            2 | 3 => {
                let parts: Vec<&str> = m.split(['-', '/']).collect();
                format!("{}-{}", parts[2], parts[1])
            }
            _ => m[..7].replace('_', "-"),
        };
        return Some(normalized);
    }

    warn!(file = %name, "no date pattern found in filename");
    None
}
