//! Source-reference resolution for IMPORT/INCLUDE and the loader seam.
//!
//! A `src` field is a URL-like string: `game:data/foo.json`,
//! `mod:patches/bar.json`, or `vfs:anything` for host-defined origins. A
//! string with no recognizable scheme keeps the caller's default origin with
//! the whole string as the path.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

// ── Origins ───────────────────────────────────────────────────────────────

/// Where a `src` reference resolves from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// The host's base document tree.
    Game,
    /// The patching mod's own file tree.
    Mod,
    /// A host-defined virtual filesystem, keyed by its scheme tag.
    Custom(String),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Game => write!(f, "game"),
            Origin::Mod => write!(f, "mod"),
            Origin::Custom(tag) => write!(f, "{tag}"),
        }
    }
}

/// A parsed `src` reference: origin plus scheme-stripped path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrcReference {
    pub origin: Origin,
    pub path: String,
}

/// Splits a `src` string into origin and path.
///
/// `game:` and `mod:` map to the fixed origins; any other scheme passes
/// through as a custom origin tag; no scheme falls back to `default_origin`.
pub fn parse_src(src: &str, default_origin: Origin) -> SrcReference {
    if let Some((scheme, rest)) = src.split_once(':') {
        if !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphanumeric()) {
            let origin = match scheme {
                "game" => Origin::Game,
                "mod" => Origin::Mod,
                other => Origin::Custom(other.to_string()),
            };
            return SrcReference {
                origin,
                path: rest.to_string(),
            };
        }
    }
    SrcReference {
        origin: default_origin,
        path: src.to_string(),
    }
}

// ── Loader contract ───────────────────────────────────────────────────────

/// Failure resolving a `src` reference.
#[derive(Debug, Error)]
#[error("failed to load {origin}:{path}: {reason}")]
pub struct LoadError {
    pub origin: String,
    pub path: String,
    pub reason: String,
}

impl LoadError {
    pub fn new(origin: &Origin, path: &str, reason: impl fmt::Display) -> Self {
        Self {
            origin: origin.to_string(),
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Resolves `src` references to parsed JSON values.
///
/// The only I/O boundary of the engine; everything else is pure in-memory
/// computation. Implementations decide what each origin means.
pub trait Loader {
    fn load(&self, origin: &Origin, path: &str) -> Result<Value, LoadError>;
}

/// A loader that refuses every reference.
///
/// The hook for hosts that must not honor IMPORT/INCLUDE at all, and the
/// default for tools operating on self-contained patches.
pub struct DenyLoader;

impl Loader for DenyLoader {
    fn load(&self, origin: &Origin, path: &str) -> Result<Value, LoadError> {
        Err(LoadError::new(origin, path, "external references are disabled"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_origins() {
        let r = parse_src("game:data/chars.json", Origin::Mod);
        assert_eq!(r.origin, Origin::Game);
        assert_eq!(r.path, "data/chars.json");

        let r = parse_src("mod:patches/a.json", Origin::Game);
        assert_eq!(r.origin, Origin::Mod);
        assert_eq!(r.path, "patches/a.json");
    }

    #[test]
    fn custom_scheme_passes_through() {
        let r = parse_src("vfs:some/file.json", Origin::Game);
        assert_eq!(r.origin, Origin::Custom("vfs".into()));
        assert_eq!(r.path, "some/file.json");
    }

    #[test]
    fn schemeless_uses_default() {
        let r = parse_src("data/chars.json", Origin::Game);
        assert_eq!(r.origin, Origin::Game);
        assert_eq!(r.path, "data/chars.json");

        let r = parse_src("plain.json", Origin::Mod);
        assert_eq!(r.origin, Origin::Mod);
    }

    #[test]
    fn non_scheme_colon_is_part_of_the_path() {
        let r = parse_src("dir/with:colon.json", Origin::Mod);
        assert_eq!(r.origin, Origin::Mod);
        assert_eq!(r.path, "dir/with:colon.json");
    }

    #[test]
    fn deny_loader_refuses() {
        assert!(DenyLoader.load(&Origin::Game, "x.json").is_err());
    }
}
