//! Scheme-tagged resource locations and their URI form.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("empty resource location")]
    Empty,

    #[error("jar location is missing the '!/' separator: {0}")]
    MissingJarSeparator(String),

    #[error("jar location must point at a file: archive: {0}")]
    NonFileArchive(String),
}

/// A scheme-tagged address for one package directory on one classpath root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceLocation {
    File { path: PathBuf },
    Jar { archive: PathBuf, entry: String },
    Other { scheme: String, raw: String },
}

impl ResourceLocation {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File { path: path.into() }
    }

    pub fn jar(archive: impl Into<PathBuf>, entry: impl Into<String>) -> Self {
        Self::Jar {
            archive: archive.into(),
            entry: entry.into().trim_matches('/').to_string(),
        }
    }

    pub fn scheme(&self) -> &str {
        match self {
            Self::File { .. } => "file",
            Self::Jar { .. } => "jar",
            Self::Other { scheme, .. } => scheme,
        }
    }

    /// Accepts `file:<path>`, `file://<path>`, `jar:file:<archive>!/<entry>`
    /// and bare filesystem paths.
    pub fn parse(raw: &str) -> Result<Self, ResourceError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ResourceError::Empty);
        }

        let Some((scheme, rest)) = split_scheme(raw) else {
            return Ok(Self::file(raw));
        };

        match scheme.to_ascii_lowercase().as_str() {
            "file" => Ok(Self::file(strip_authority(rest))),
            "jar" => {
                let (archive, entry) = rest
                    .split_once("!/")
                    .ok_or_else(|| ResourceError::MissingJarSeparator(raw.to_string()))?;
                let archive_path = match split_scheme(archive) {
                    Some((s, p)) if s.eq_ignore_ascii_case("file") => strip_authority(p),
                    Some(_) => return Err(ResourceError::NonFileArchive(raw.to_string())),
                    None => archive,
                };
                Ok(Self::jar(archive_path, entry))
            }
            _ => Ok(Self::Other {
                scheme: scheme.to_string(),
                raw: raw.to_string(),
            }),
        }
    }
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File { path } => write!(f, "file:{}", path.display()),
            Self::Jar { archive, entry } => {
                write!(f, "jar:file:{}!/{}", archive.display(), entry)
            }
            Self::Other { raw, .. } => f.write_str(raw),
        }
    }
}

// Single-letter prefixes are drive letters, not schemes.
fn split_scheme(raw: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = raw.split_once(':')?;
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if scheme.len() < 2 || !first.is_ascii_alphabetic() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return None;
    }
    Some((scheme, rest))
}

fn strip_authority(rest: &str) -> &str {
    match rest.strip_prefix("//") {
        Some(after) if after.starts_with('/') => after,
        Some(after) => after.strip_prefix("localhost").unwrap_or(after),
        None => rest,
    }
}
