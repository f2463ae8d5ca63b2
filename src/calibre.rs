//! Bridge to the external book-management suite (Calibre).
//!
//! The suite owns the library database and metadata formats; this module
//! only makes narrow calls into its command surface: read title/author/
//! language from a file with `ebook-meta`, and write one identifier field
//! back. Nothing here re-implements the library format.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use tracing::debug;

/// Primary environment variable for the library root.
pub const LIBRARY_ENV: &str = "BOOKHOUND_LIBRARY";
/// Legacy environment variable, honored for existing setups.
pub const LEGACY_LIBRARY_ENV: &str = "CALIBRE_LIBRARY_PATH";

const DEFAULT_LIBRARY: &str = "~/Calibre Library";

/// Embedded metadata as reported by `ebook-meta`. Every field is optional;
/// corrupt or bare files simply yield less.
#[derive(Debug, Clone, Default)]
pub struct EbookMeta {
    pub title: Option<String>,
    pub author: Option<String>,
    pub language: Option<String>,
    pub series: Option<String>,
}

/// Resolve the book-collection root: explicit flag, then the primary
/// environment variable, then the legacy one, then the built-in default.
pub fn resolve_library_root(flag: Option<&Path>) -> PathBuf {
    if let Some(path) = flag {
        return path.to_path_buf();
    }
    for var in [LIBRARY_ENV, LEGACY_LIBRARY_ENV] {
        if let Ok(value) = std::env::var(var) {
            if !value.trim().is_empty() {
                return PathBuf::from(value);
            }
        }
    }
    PathBuf::from(shellexpand::tilde(DEFAULT_LIBRARY).into_owned())
}

/// Whether the metadata tool is on the PATH.
pub fn ebook_meta_available() -> bool {
    which::which("ebook-meta").is_ok()
}

/// Read embedded metadata from a file. Fails when the tool is missing or
/// the file is unreadable; callers treat failure as "no embedded metadata".
pub fn read_metadata(path: &Path) -> Result<EbookMeta> {
    let output = Command::new("ebook-meta")
        .arg(path)
        .output()
        .with_context(|| format!("failed to run ebook-meta for {}", path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "ebook-meta exited with {:?}: {}",
            output.status.code(),
            stderr.trim()
        );
    }

    Ok(parse_ebook_meta_output(&String::from_utf8_lossy(&output.stdout)))
}

/// Write one identifier into a file's existing metadata record.
pub fn write_asin(path: &Path, asin: &str) -> Result<()> {
    debug!(path = %path.display(), asin = asin, "writing identifier");
    let output = Command::new("ebook-meta")
        .arg(path)
        .arg("--identifier")
        .arg(format!("amazon:{asin}"))
        .output()
        .with_context(|| format!("failed to run ebook-meta for {}", path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "ebook-meta exited with {:?}: {}",
            output.status.code(),
            stderr.trim()
        );
    }
    Ok(())
}

/// Parse `ebook-meta`'s `Field : value` listing.
fn parse_ebook_meta_output(stdout: &str) -> EbookMeta {
    let mut meta = EbookMeta::default();

    for line in stdout.lines() {
        let Some((field, value)) = line.split_once(':') else {
            continue;
        };
        let field = field.trim();
        let value = value.trim();
        if value.is_empty() || value == "Unknown" {
            continue;
        }

        match field {
            "Title" => meta.title = Some(value.to_string()),
            "Author(s)" => {
                // "Brandon Sanderson [Sanderson, Brandon]" -> display form.
                let display = value.split('[').next().unwrap_or(value).trim();
                let first = display.split('&').next().unwrap_or(display).trim();
                if !first.is_empty() {
                    meta.author = Some(first.to_string());
                }
            }
            "Languages" => {
                let first = value.split(',').next().unwrap_or(value).trim();
                if !first.is_empty() {
                    meta.language = Some(first.to_string());
                }
            }
            "Series" => {
                // "Mistborn #1" -> series name without the index.
                let name = value.split('#').next().unwrap_or(value).trim();
                if !name.is_empty() {
                    meta.series = Some(name.to_string());
                }
            }
            _ => {}
        }
    }

    meta
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Title               : Kinder des Nebels
Title sort          : Kinder des Nebels
Author(s)           : Brandon Sanderson [Sanderson, Brandon]
Publisher           : Heyne Verlag
Languages           : deu
Series              : Mistborn #1
";

    #[test]
    fn parses_standard_listing() {
        let meta = parse_ebook_meta_output(SAMPLE);
        assert_eq!(meta.title.as_deref(), Some("Kinder des Nebels"));
        assert_eq!(meta.author.as_deref(), Some("Brandon Sanderson"));
        assert_eq!(meta.language.as_deref(), Some("deu"));
        assert_eq!(meta.series.as_deref(), Some("Mistborn"));
    }

    #[test]
    fn multiple_authors_take_first() {
        let meta = parse_ebook_meta_output("Author(s) : Terry Pratchett & Neil Gaiman\n");
        assert_eq!(meta.author.as_deref(), Some("Terry Pratchett"));
    }

    #[test]
    fn unknown_fields_stay_empty() {
        let meta = parse_ebook_meta_output("Title : Unknown\nComments : whatever\n");
        assert!(meta.title.is_none());
        assert!(meta.author.is_none());
    }

    #[test]
    fn garbage_yields_empty_meta() {
        let meta = parse_ebook_meta_output("\u{0}\u{1}not a listing at all");
        assert!(meta.title.is_none());
        assert!(meta.language.is_none());
    }

    #[test]
    fn library_root_flag_wins() {
        let root = resolve_library_root(Some(Path::new("/tmp/books")));
        assert_eq!(root, PathBuf::from("/tmp/books"));
    }

    #[test]
    #[serial_test::serial]
    fn library_root_env_priority() {
        std::env::set_var(LIBRARY_ENV, "/tmp/primary");
        std::env::set_var(LEGACY_LIBRARY_ENV, "/tmp/legacy");
        assert_eq!(resolve_library_root(None), PathBuf::from("/tmp/primary"));

        std::env::remove_var(LIBRARY_ENV);
        assert_eq!(resolve_library_root(None), PathBuf::from("/tmp/legacy"));

        // An explicit flag beats both variables.
        assert_eq!(
            resolve_library_root(Some(Path::new("/tmp/flag"))),
            PathBuf::from("/tmp/flag")
        );

        std::env::remove_var(LEGACY_LIBRARY_ENV);
    }
}
