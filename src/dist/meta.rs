//! Metadata descriptors in both registry formats.
//!
//! The current structured form (spec version 2) is JSON with the full
//! phase/relation prereqs structure; the legacy simple form (spec version
//! 1.4) is YAML with flattened requirement maps. Both are written on every
//! dist build.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::config::ProjectConfig;
use crate::error::Result;
use crate::prereqs::{Phase, Prereqs, Relation};

/// Current-form descriptor filename.
pub const META_JSON: &str = "META.json";

/// Legacy-form descriptor filename.
pub const META_YML: &str = "META.yml";

/// Generator signature stamped into every descriptor.
pub const GENERATOR: &str = concat!("distkit version ", env!("CARGO_PKG_VERSION"));

/// Release status written into the current form; nothing in the pipeline
/// produces pre-releases today.
pub const RELEASE_STATUS: &str = "stable";

#[derive(Serialize)]
struct SpecVersion {
    version: f32,
}

#[derive(Serialize)]
struct MetaCurrent<'a> {
    #[serde(rename = "meta-spec")]
    meta_spec: SpecVersion,
    name: &'a str,
    version: &'a str,
    #[serde(rename = "abstract")]
    abstract_: &'a str,
    author: Vec<&'a str>,
    license: Vec<&'a str>,
    prereqs: &'a Prereqs,
    release_status: &'static str,
    generated_by: &'static str,
}

#[derive(Serialize)]
struct MetaLegacy<'a> {
    #[serde(rename = "meta-spec")]
    meta_spec: SpecVersion,
    name: &'a str,
    version: &'a str,
    #[serde(rename = "abstract")]
    abstract_: &'a str,
    author: Vec<&'a str>,
    license: &'a str,
    configure_requires: BTreeMap<String, String>,
    build_requires: BTreeMap<String, String>,
    requires: BTreeMap<String, String>,
    generated_by: &'static str,
}

/// Serialize the current-form descriptor.
pub fn current(config: &ProjectConfig, prereqs: &Prereqs) -> Result<String> {
    let meta = MetaCurrent {
        meta_spec: SpecVersion { version: 2.0 },
        name: &config.name,
        version: &config.version,
        abstract_: &config.abstract_,
        author: vec![config.author.as_str()],
        license: vec![config.license.as_str()],
        prereqs,
        release_status: RELEASE_STATUS,
        generated_by: GENERATOR,
    };
    let mut rendered = serde_json::to_string_pretty(&meta)?;
    rendered.push('\n');
    Ok(rendered)
}

/// Serialize the legacy-form descriptor.
pub fn legacy(config: &ProjectConfig, prereqs: &Prereqs) -> Result<String> {
    let meta = MetaLegacy {
        meta_spec: SpecVersion { version: 1.4 },
        name: &config.name,
        version: &config.version,
        abstract_: &config.abstract_,
        author: vec![config.author.as_str()],
        license: &config.license,
        configure_requires: prereqs.requirement_map(Phase::Configure, Relation::Requires),
        build_requires: prereqs.requirement_map(Phase::Build, Relation::Requires),
        requires: prereqs.requirement_map(Phase::Runtime, Relation::Requires),
        generated_by: GENERATOR,
    };
    let rendered = serde_yaml::to_string(&meta)?;
    Ok(format!("---\n{rendered}"))
}

/// Write both descriptor forms into `dir`.
pub fn write(dir: &Path, config: &ProjectConfig, prereqs: &Prereqs) -> Result<()> {
    std::fs::write(dir.join(META_JSON), current(config, prereqs)?)?;
    std::fs::write(dir.join(META_YML), legacy(config, prereqs)?)?;
    Ok(())
}
