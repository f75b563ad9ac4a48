//! Version-marker normalization and floor comparison.
//!
//! Declared version floors come in three shapes: bare dotted triples
//! (`1.2.3`), marker-prefixed triples (`v1.2.3`), and short numeric forms
//! (`1.2`). Bare triples gain the `v` marker so numeric-only and
//! marker-prefixed versions compare consistently everywhere downstream.
//! Short numeric forms are padded for comparison only, never rewritten.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

use crate::error::{DistError, Result};

static BARE_TRIPLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("valid pattern"));

static SHORT_NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+)?$").expect("valid pattern"));

/// Prefix a bare `N.N.N` version with the `v` marker.
///
/// Anything that is not exactly three dotted integers passes through
/// untouched; two- and four-component forms keep their original spelling.
pub fn normalize(version: &str) -> String {
    if BARE_TRIPLE.is_match(version) {
        format!("v{version}")
    } else {
        version.to_string()
    }
}

/// Parse a version floor into a comparable [`Version`].
///
/// Strips the `v` marker and pads one- or two-component numeric forms with
/// trailing zeros. A string that still fails to parse is a hard error; a
/// malformed floor must never silently lose a merge.
pub fn parse_floor(version: &str) -> Result<Version> {
    let bare = version.strip_prefix('v').unwrap_or(version);
    let padded = if SHORT_NUMERIC.is_match(bare) {
        let dots = bare.bytes().filter(|b| *b == b'.').count();
        match dots {
            0 => format!("{bare}.0.0"),
            _ => format!("{bare}.0"),
        }
    } else {
        bare.to_string()
    };
    Version::parse(&padded).map_err(|source| DistError::Version {
        input: version.to_string(),
        source,
    })
}

/// Compare two version floors.
pub fn compare(a: &str, b: &str) -> Result<Ordering> {
    Ok(parse_floor(a)?.cmp(&parse_floor(b)?))
}
