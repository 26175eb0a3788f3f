//! Localization keys from `.lang` files.
//!
//! A `.lang` file lives under a `Languages` directory, optionally inside a
//! locale directory (`Languages/en-US/items.lang`). Files directly inside
//! `Languages` belong to the `fallback` locale. Keys are prefixed with the
//! file's directory path and stem, joined with dots.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use super::files::{COMMON_DIRECTORY, SERVER_DIRECTORY};
use super::{RecordGroups, ValueRecord};

pub const LANGUAGES_DIRECTORY: &str = "Languages";
pub const FALLBACK_LOCALE: &str = "fallback";
pub const LANG_EXTENSION: &str = ".lang";

/// Location of a language file, derived from its path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangPathInfo {
    pub locale: String,
    /// Prefix applied to every key of the file; may be empty
    pub prefix: String,
}

/// Locale and key prefix of a language file, if it sits under `Languages`
pub fn lang_path_info(file: &Path) -> Option<LangPathInfo> {
    let segments: Vec<String> = file
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    let languages = segments
        .iter()
        .position(|segment| segment.eq_ignore_ascii_case(LANGUAGES_DIRECTORY))?;
    let next = segments.get(languages + 1)?;

    let (locale, content_start) = if is_lang_file(next) {
        (FALLBACK_LOCALE.to_string(), languages + 1)
    } else {
        (next.clone(), languages + 2)
    };

    let content = segments.get(content_start..)?;
    let (file_name, directories) = content.split_last()?;
    let stem = match file_name.rfind('.') {
        Some(dot) => &file_name[..dot],
        None => file_name.as_str(),
    };

    let prefix = directories
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(stem))
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join(".");

    Some(LangPathInfo { locale, prefix })
}

/// `(full key, translation)` pairs of one language file
pub fn parse_lang_source(source: &str, prefix: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    let mut lines = source.lines();
    let mut first = true;

    while let Some(raw) = lines.next() {
        let mut line = if first {
            first = false;
            raw.trim_start_matches('\u{FEFF}').to_string()
        } else {
            raw.to_string()
        };

        while line.ends_with('\\') {
            line.pop();
            match lines.next() {
                Some(continuation) => line.push_str(continuation),
                None => break,
            }
        }

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some(eq) = line.find('=').filter(|eq| *eq > 0) else {
            continue;
        };
        let key = line[..eq].trim();
        if key.is_empty() {
            continue;
        }
        let translation = line[eq + 1..].trim();

        let full_key = if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        };
        entries.push((full_key, translation.to_string()));
    }

    entries
}

fn is_lang_file(name: &str) -> bool {
    name.to_lowercase().ends_with(LANG_EXTENSION)
}

/// Every `.lang` file under the given directories, sorted
pub fn lang_files<'p>(roots: impl IntoIterator<Item = &'p Path>) -> BTreeSet<PathBuf> {
    let mut files = BTreeSet::new();
    for root in roots {
        if !root.is_dir() {
            continue;
        }
        for entry in WalkDir::new(root).follow_links(true).into_iter().filter_map(Result::ok) {
            if entry.file_type().is_file() && is_lang_file(&entry.file_name().to_string_lossy()) {
                files.insert(entry.into_path());
            }
        }
    }
    files
}

/// Localization keys per locale across all packs and extra language roots
pub fn collect_keys(pack_roots: &BTreeSet<PathBuf>, language_roots: &[PathBuf]) -> RecordGroups {
    let mut roots: Vec<PathBuf> = Vec::new();
    for pack_root in pack_roots {
        roots.push(pack_root.join(SERVER_DIRECTORY).join(LANGUAGES_DIRECTORY));
        roots.push(pack_root.join(COMMON_DIRECTORY).join(LANGUAGES_DIRECTORY));
    }
    roots.extend(language_roots.iter().cloned());

    let mut groups = RecordGroups::new();
    for file in lang_files(roots.iter().map(PathBuf::as_path)) {
        let Some(info) = lang_path_info(&file) else {
            continue;
        };
        let source = match fs::read_to_string(&file) {
            Ok(source) => source,
            Err(e) => {
                debug!("Skipping unreadable language file {}: {}", file.display(), e);
                continue;
            }
        };

        let provenance = file.to_string_lossy().into_owned();
        let records = groups.entry(info.locale).or_default();
        for (key, translation) in parse_lang_source(&source, &info.prefix) {
            records.push(ValueRecord::new(key, Some(provenance.clone())).with_translation(translation));
        }
    }

    groups
}
