//! Project descriptor loading and identity back-fill.
//!
//! `dist.toml` declares at minimum the primary-module reference; identity
//! fields missing from it are back-filled from the primary module's header
//! and it is a hard error if any remain empty.

use std::path::{Path, PathBuf};

use crate::cli::output::OutputManager;
use crate::error::{DistError, Result};
use crate::prereqs::version;

/// Project descriptor filename at the project root.
pub const CONFIG_FILE: &str = "dist.toml";

/// Dependency manifest filename at the project root.
pub const PREREQS_FILE: &str = "prereqs.toml";

/// Changelog filename checked by the release sequence.
pub const CHANGES_FILE: &str = "Changes";

/// Default external package manager for probing and installing.
pub const DEFAULT_INSTALLER: &str = "pkgm";

/// Default test command run inside the staging directory.
pub const DEFAULT_TEST_COMMAND: &str = "make test";

/// Resolved project configuration.
///
/// All identity fields are non-empty by the time [`ProjectConfig::load`]
/// returns.
#[derive(Clone, Debug)]
pub struct ProjectConfig {
    pub name: String,
    /// Marker-normalized version (bare `N.N.N` becomes `vN.N.N`).
    pub version: String,
    pub abstract_: String,
    pub author: String,
    /// SPDX license identifier.
    pub license: String,
    pub copyright_holder: Option<String>,
    /// Primary module reference, e.g. `My::Library`.
    pub main_module: String,
    pub test_command: Option<String>,
    pub installer: Option<String>,
    /// Script entry points installed with the distribution.
    pub scripts: Vec<String>,
    /// Plugin registrations in configuration order: uppercase-keyed
    /// top-level tables with their config payloads.
    pub plugins: Vec<(String, toml::Value)>,
}

impl ProjectConfig {
    /// Load `dist.toml` from `root`, back-filling identity fields from the
    /// primary module via `probe`.
    ///
    /// A missing descriptor and missing identity fields are handled aborts:
    /// the diagnostic is printed here and [`DistError::AlreadyReported`]
    /// propagates. A descriptor that fails to parse is an ordinary error.
    pub fn load(root: &Path, probe: &dyn ModuleProbe, output: &OutputManager) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                output.error(&format!(
                    "{} not found; run `distkit new` to scaffold a project",
                    path.display()
                ));
                return Err(DistError::AlreadyReported);
            }
            Err(e) => return Err(e.into()),
        };
        let value: toml::Value = toml::from_str(&raw)?;
        let Some(table) = value.as_table() else {
            return Err(DistError::Config {
                reason: format!("{}: expected a table at the top level", path.display()),
            });
        };

        let get = |key: &str| table.get(key).and_then(|v| v.as_str()).map(String::from);

        let Some(main_module) = get("main_module") else {
            output.error(&format!("{}: `main_module` is required", path.display()));
            return Err(DistError::AlreadyReported);
        };

        let mut config = ProjectConfig {
            name: get("name").unwrap_or_default(),
            version: get("version").unwrap_or_default(),
            abstract_: get("abstract").unwrap_or_default(),
            author: get("author").unwrap_or_default(),
            license: get("license").unwrap_or_default(),
            copyright_holder: get("copyright_holder"),
            main_module,
            test_command: get("test_command"),
            installer: get("installer"),
            scripts: table
                .get("scripts")
                .and_then(|v| v.as_array())
                .map(|arr| {
                    arr.iter()
                        .filter_map(|v| v.as_str().map(String::from))
                        .collect()
                })
                .unwrap_or_default(),
            plugins: table
                .iter()
                .filter(|(key, _)| key.chars().next().is_some_and(char::is_uppercase))
                .map(|(key, payload)| (key.clone(), payload.clone()))
                .collect(),
        };

        config.backfill(root, probe)?;

        if config.name.is_empty() {
            config.name = config.main_module.replace("::", "-");
        }
        config.version = version::normalize(&config.version);

        for (field, value) in [
            ("name", &config.name),
            ("version", &config.version),
            ("abstract", &config.abstract_),
            ("author", &config.author),
            ("license", &config.license),
        ] {
            if value.is_empty() {
                output.error(&format!(
                    "missing `{field}`: not in {CONFIG_FILE} and not declared by {}",
                    config.main_module
                ));
                return Err(DistError::AlreadyReported);
            }
        }

        Ok(config)
    }

    fn backfill(&mut self, root: &Path, probe: &dyn ModuleProbe) -> Result<()> {
        if !self.version.is_empty()
            && !self.abstract_.is_empty()
            && !self.author.is_empty()
            && !self.license.is_empty()
        {
            return Ok(());
        }
        let facts = probe.probe(&self.main_module, root)?;
        let fill = |slot: &mut String, fact: Option<String>| {
            if slot.is_empty() {
                if let Some(fact) = fact {
                    *slot = fact;
                }
            }
        };
        fill(&mut self.version, facts.version);
        fill(&mut self.abstract_, facts.abstract_);
        fill(&mut self.author, facts.author);
        fill(&mut self.license, facts.license);
        Ok(())
    }

    /// `<name>-<version>` distribution stem.
    pub fn dist_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    pub fn installer(&self) -> &str {
        self.installer.as_deref().unwrap_or(DEFAULT_INSTALLER)
    }

    pub fn test_command(&self) -> &str {
        self.test_command.as_deref().unwrap_or(DEFAULT_TEST_COMMAND)
    }

    pub fn copyright_holder(&self) -> &str {
        self.copyright_holder.as_deref().unwrap_or(&self.author)
    }
}

/// Facts readable from the primary module file.
#[derive(Clone, Debug, Default)]
pub struct ModuleFacts {
    pub version: Option<String>,
    pub abstract_: Option<String>,
    pub author: Option<String>,
    pub license: Option<String>,
}

/// Extraction of identity facts from the primary source artifact.
pub trait ModuleProbe {
    fn probe(&self, main_module: &str, root: &Path) -> Result<ModuleFacts>;
}

/// Relative path of a primary module file: `My::Library` → `lib/My/Library.mod`.
pub fn module_path(main_module: &str) -> PathBuf {
    let mut path = PathBuf::from("lib");
    for part in main_module.split("::") {
        path.push(part);
    }
    path.set_extension("mod");
    path
}

/// Header-comment scanner over the primary module file.
///
/// Reads `# VERSION:`, `# ABSTRACT:`, `# AUTHOR:` and `# LICENSE:` lines.
/// A missing module file yields empty facts; the caller's non-empty
/// validation decides whether that is fatal.
pub struct FileModuleProbe;

impl ModuleProbe for FileModuleProbe {
    fn probe(&self, main_module: &str, root: &Path) -> Result<ModuleFacts> {
        let path = root.join(module_path(main_module));
        let mut facts = ModuleFacts::default();
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("primary module {} not found", path.display());
                return Ok(facts);
            }
            Err(e) => return Err(e.into()),
        };
        for line in raw.lines() {
            let Some(rest) = line.trim_start().strip_prefix('#') else {
                continue;
            };
            let rest = rest.trim_start();
            for (tag, slot) in [
                ("VERSION:", &mut facts.version),
                ("ABSTRACT:", &mut facts.abstract_),
                ("AUTHOR:", &mut facts.author),
                ("LICENSE:", &mut facts.license),
            ] {
                if let Some(value) = rest.strip_prefix(tag) {
                    let value = value.trim();
                    if slot.is_none() && !value.is_empty() {
                        *slot = Some(value.to_string());
                    }
                }
            }
        }
        Ok(facts)
    }
}
