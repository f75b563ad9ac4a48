//! Merged dependency specification: phase → relation → package → version floor.
//!
//! The spec is consulted by the verifier and by artifact generation; merging
//! only ever raises a stored floor, never lowers one.

pub mod version;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use crate::bail;
use crate::error::Result;

/// Reserved package name carrying the minimum language-runtime floor.
pub const RUNTIME_PACKAGE: &str = "runtime";

/// Dependency lifecycle stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Configure,
    Build,
    Test,
    Runtime,
    Develop,
}

impl Phase {
    /// All phases, in declaration-file order.
    pub const ALL: [Phase; 5] = [
        Phase::Configure,
        Phase::Build,
        Phase::Test,
        Phase::Runtime,
        Phase::Develop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Configure => "configure",
            Phase::Build => "build",
            Phase::Test => "test",
            Phase::Runtime => "runtime",
            Phase::Develop => "develop",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "configure" => Ok(Phase::Configure),
            "build" => Ok(Phase::Build),
            "test" => Ok(Phase::Test),
            "runtime" => Ok(Phase::Runtime),
            "develop" => Ok(Phase::Develop),
            other => Err(format!("unknown phase: {other}")),
        }
    }
}

/// Strength of a dependency requirement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Requires,
    Recommends,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Requires => "requires",
            Relation::Recommends => "recommends",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "requires" => Ok(Relation::Requires),
            "recommends" => Ok(Relation::Recommends),
            other => Err(format!("unknown relation: {other}")),
        }
    }
}

/// Merged dependency requirements for one pipeline run.
///
/// Serializes as the raw three-level mapping, which is exactly the shape the
/// metadata descriptors carry.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct Prereqs {
    entries: BTreeMap<Phase, BTreeMap<Relation, BTreeMap<String, String>>>,
}

impl Prereqs {
    /// Insert or raise the floor for `(phase, relation, package)`.
    ///
    /// Keeps `max(existing, incoming)` under semantic-version comparison.
    /// Malformed version strings are a hard error, not a skipped update.
    pub fn register(
        &mut self,
        phase: Phase,
        relation: Relation,
        package: &str,
        floor: &str,
    ) -> Result<()> {
        let floor = version::normalize(floor);
        let slot = self
            .entries
            .entry(phase)
            .or_default()
            .entry(relation)
            .or_default();
        let raise = match slot.get(package) {
            Some(existing) => {
                let raise =
                    version::compare(&floor, existing)? == std::cmp::Ordering::Greater;
                if raise {
                    log::debug!("{phase}.{relation}: raising {package} to {floor}");
                }
                raise
            }
            None => {
                // Validate even first-time inserts so a bad floor surfaces here.
                version::parse_floor(&floor)?;
                true
            }
        };
        if raise {
            slot.insert(package.to_string(), floor);
        }
        Ok(())
    }

    /// Stored floor for one requirement, if declared.
    pub fn floor(&self, phase: Phase, relation: Relation, package: &str) -> Option<&str> {
        self.entries
            .get(&phase)?
            .get(&relation)?
            .get(package)
            .map(String::as_str)
    }

    /// All `(package, floor)` pairs declared under one phase and relation.
    pub fn packages(&self, phase: Phase, relation: Relation) -> Vec<(&str, &str)> {
        self.entries
            .get(&phase)
            .and_then(|m| m.get(&relation))
            .map(|pkgs| {
                pkgs.iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Owned copy of one `phase.relation` map, without the reserved
    /// [`RUNTIME_PACKAGE`] entry. Used for build-script rendering.
    pub fn requirement_map(&self, phase: Phase, relation: Relation) -> BTreeMap<String, String> {
        self.packages(phase, relation)
            .into_iter()
            .filter(|(pkg, _)| *pkg != RUNTIME_PACKAGE)
            .map(|(pkg, floor)| (pkg.to_string(), floor.to_string()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries
            .values()
            .all(|rels| rels.values().all(BTreeMap::is_empty))
    }

    /// Read a dependency manifest (`[<phase>.<relation>]` tables mapping
    /// package name to version floor) and merge every entry.
    ///
    /// A missing file yields an empty spec; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let mut prereqs = Prereqs::default();
        if !path.exists() {
            log::debug!("no dependency manifest at {}", path.display());
            return Ok(prereqs);
        }
        let raw = std::fs::read_to_string(path)?;
        let value: toml::Value = toml::from_str(&raw)?;
        let Some(table) = value.as_table() else {
            bail!("{}: expected a table at the top level", path.display());
        };
        for (phase_key, relations) in table {
            let Ok(phase) = Phase::from_str(phase_key) else {
                bail!("{}: unknown phase `{phase_key}`", path.display());
            };
            let Some(relations) = relations.as_table() else {
                bail!("{}: `{phase_key}` must be a table", path.display());
            };
            for (relation_key, packages) in relations {
                let Ok(relation) = Relation::from_str(relation_key) else {
                    bail!(
                        "{}: unknown relation `{phase_key}.{relation_key}`",
                        path.display()
                    );
                };
                let Some(packages) = packages.as_table() else {
                    bail!(
                        "{}: `{phase_key}.{relation_key}` must be a table",
                        path.display()
                    );
                };
                for (package, floor) in packages {
                    let Some(floor) = floor.as_str() else {
                        bail!(
                            "{}: floor for `{package}` must be a string",
                            path.display()
                        );
                    };
                    prereqs.register(phase, relation, package, floor)?;
                }
            }
        }
        Ok(prereqs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_keeps_the_highest_floor() {
        let mut prereqs = Prereqs::default();
        prereqs
            .register(Phase::Runtime, Relation::Requires, "Foo", "1.0.0")
            .unwrap();
        prereqs
            .register(Phase::Runtime, Relation::Requires, "Foo", "2.0.0")
            .unwrap();
        prereqs
            .register(Phase::Runtime, Relation::Requires, "Foo", "1.5.0")
            .unwrap();
        assert_eq!(
            prereqs.floor(Phase::Runtime, Relation::Requires, "Foo"),
            Some("v2.0.0")
        );
    }

    #[test]
    fn register_is_commutative_and_idempotent() {
        let merge = |floors: &[&str]| {
            let mut prereqs = Prereqs::default();
            for floor in floors {
                prereqs
                    .register(Phase::Build, Relation::Requires, "Bar", floor)
                    .unwrap();
                // Repeating the same input changes nothing.
                prereqs
                    .register(Phase::Build, Relation::Requires, "Bar", floor)
                    .unwrap();
            }
            prereqs
                .floor(Phase::Build, Relation::Requires, "Bar")
                .unwrap()
                .to_string()
        };
        assert_eq!(merge(&["0.1", "3.0.0", "2.2"]), "v3.0.0");
        assert_eq!(merge(&["2.2", "0.1", "3.0.0"]), "v3.0.0");
        assert_eq!(merge(&["3.0.0", "2.2", "0.1"]), "v3.0.0");
    }

    #[test]
    fn malformed_floor_is_an_error_on_merge() {
        let mut prereqs = Prereqs::default();
        prereqs
            .register(Phase::Test, Relation::Requires, "Baz", "1.0.0")
            .unwrap();
        assert!(prereqs
            .register(Phase::Test, Relation::Requires, "Baz", "broken")
            .is_err());
        // The stored floor is untouched by the failed merge.
        assert_eq!(
            prereqs.floor(Phase::Test, Relation::Requires, "Baz"),
            Some("v1.0.0")
        );
    }

    #[test]
    fn relations_are_tracked_separately() {
        let mut prereqs = Prereqs::default();
        prereqs
            .register(Phase::Runtime, Relation::Requires, "Foo", "1.0.0")
            .unwrap();
        prereqs
            .register(Phase::Runtime, Relation::Recommends, "Foo", "9.0.0")
            .unwrap();
        assert_eq!(
            prereqs.floor(Phase::Runtime, Relation::Requires, "Foo"),
            Some("v1.0.0")
        );
    }

    #[test]
    fn requirement_map_excludes_the_runtime_floor() {
        let mut prereqs = Prereqs::default();
        prereqs
            .register(Phase::Runtime, Relation::Requires, RUNTIME_PACKAGE, "1.4.0")
            .unwrap();
        prereqs
            .register(Phase::Runtime, Relation::Requires, "Foo", "1.0.0")
            .unwrap();
        let map = prereqs.requirement_map(Phase::Runtime, Relation::Requires);
        assert!(!map.contains_key(RUNTIME_PACKAGE));
        assert_eq!(map.get("Foo").map(String::as_str), Some("v1.0.0"));
    }

    #[test]
    fn loads_a_dependency_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prereqs.toml");
        std::fs::write(
            &path,
            r#"
[runtime.requires]
Foo = "1.2.3"
runtime = "1.4"

[develop.recommends]
Linter = "0.9"
"#,
        )
        .unwrap();
        let prereqs = Prereqs::load(&path).unwrap();
        assert_eq!(
            prereqs.floor(Phase::Runtime, Relation::Requires, "Foo"),
            Some("v1.2.3")
        );
        assert_eq!(
            prereqs.floor(Phase::Develop, Relation::Recommends, "Linter"),
            Some("0.9")
        );
    }

    #[test]
    fn missing_manifest_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let prereqs = Prereqs::load(&dir.path().join("prereqs.toml")).unwrap();
        assert!(prereqs.is_empty());
    }
}
