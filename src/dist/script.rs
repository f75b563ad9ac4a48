//! Build-script generation from the distribution template.
//!
//! Renders `build.sh` with the project identity, the minimum runtime floor,
//! the configured script entry points, and the configure/build/runtime
//! requirement maps serialized as `name=floor` lines.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use serde::Serialize;

use crate::config::ProjectConfig;
use crate::error::{DistError, Result};
use crate::prereqs::{Phase, Prereqs, Relation, RUNTIME_PACKAGE};

/// Generated build-script filename.
pub const BUILD_SCRIPT: &str = "build.sh";

/// Minimum runtime floor used when the merged spec declares none.
pub const DEFAULT_RUNTIME_FLOOR: &str = "v1.0.0";

const BUILD_TEMPLATE: &str = r#"#!/bin/sh
# Build driver for {{name}} {{version}} ({{license}}).
# Generated by {{generator}}; do not edit by hand.
set -eu

NAME='{{name}}'
VERSION='{{version}}'
RUNTIME_MIN='{{runtime_min}}'

configure_requires='
{{#each configure_requires}}{{@key}}={{this}}
{{/each}}'

build_requires='
{{#each build_requires}}{{@key}}={{this}}
{{/each}}'

requires='
{{#each requires}}{{@key}}={{this}}
{{/each}}'

scripts='{{#each scripts}}{{this}} {{/each}}'

exec distkit-build "$@"
"#;

#[derive(Serialize)]
struct ScriptData<'a> {
    name: &'a str,
    version: &'a str,
    license: &'a str,
    generator: &'a str,
    runtime_min: &'a str,
    scripts: &'a [String],
    configure_requires: BTreeMap<String, String>,
    build_requires: BTreeMap<String, String>,
    requires: BTreeMap<String, String>,
}

/// Render the build script for this distribution.
pub fn render(config: &ProjectConfig, prereqs: &Prereqs, generator: &str) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars
        .register_template_string(BUILD_SCRIPT, BUILD_TEMPLATE)
        .map_err(|e| DistError::Template(format!("failed to register build template: {e}")))?;

    let data = ScriptData {
        name: &config.name,
        version: &config.version,
        license: &config.license,
        generator,
        runtime_min: prereqs
            .floor(Phase::Runtime, Relation::Requires, RUNTIME_PACKAGE)
            .unwrap_or(DEFAULT_RUNTIME_FLOOR),
        scripts: &config.scripts,
        configure_requires: prereqs.requirement_map(Phase::Configure, Relation::Requires),
        build_requires: prereqs.requirement_map(Phase::Build, Relation::Requires),
        requires: prereqs.requirement_map(Phase::Runtime, Relation::Requires),
    };

    handlebars
        .render(BUILD_SCRIPT, &data)
        .map_err(|e| DistError::Template(format!("failed to render build template: {e}")))
}

/// Render and write `build.sh` into `dir`, marking it executable on unix.
pub fn write(
    dir: &Path,
    config: &ProjectConfig,
    prereqs: &Prereqs,
    generator: &str,
) -> Result<PathBuf> {
    let path = dir.join(BUILD_SCRIPT);
    std::fs::write(&path, render(config, prereqs, generator)?)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    }
    Ok(path)
}
