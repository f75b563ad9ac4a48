//! Dependency verification against the installed environment.
//!
//! Declared requirements are checked through a [`Probe`]; packages that are
//! entirely absent can be auto-installed through the external installer,
//! everything else is reported as a soft warning and the run continues.

use crate::cli::output::OutputManager;
use crate::error::Result;
use crate::exec::Runner;
use crate::prereqs::{version, Phase, Prereqs, Relation, RUNTIME_PACKAGE};

/// Installed-version lookup for one package.
///
/// Implementations are external-capability collaborators; the pipeline ships
/// a subprocess-backed probe and tests substitute in-memory fakes.
pub trait Probe {
    /// Installed version of `package`, or `None` when it is absent.
    fn installed_version(&self, package: &str) -> Result<Option<String>>;
}

/// One verification finding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Issue {
    /// Package is not installed at all.
    Missing { package: String },
    /// Package is installed but below the required floor.
    Outdated {
        package: String,
        installed: String,
        required: String,
    },
}

impl Issue {
    pub fn package(&self) -> &str {
        match self {
            Issue::Missing { package } => package,
            Issue::Outdated { package, .. } => package,
        }
    }
}

/// Probe backed by the external package manager.
///
/// `<program> version <package>` is expected to print the installed version
/// on stdout and exit non-zero when the package is absent. When the program
/// itself cannot be found on PATH, every package reads as absent.
pub struct CommandProbe<'a> {
    runner: Runner<'a>,
    program: String,
    available: bool,
}

impl<'a> CommandProbe<'a> {
    pub fn new(runner: Runner<'a>, program: &str) -> Self {
        let available = which::which(program).is_ok();
        if !available {
            log::warn!("`{program}` not found on PATH; installed versions cannot be probed");
        }
        Self {
            runner,
            program: program.to_string(),
            available,
        }
    }
}

impl Probe for CommandProbe<'_> {
    fn installed_version(&self, package: &str) -> Result<Option<String>> {
        if !self.available {
            return Ok(None);
        }
        let output = self.runner.capture(&self.program, &["version", package])?;
        if !output.status.success() {
            return Ok(None);
        }
        let version = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        Ok((!version.is_empty()).then_some(version))
    }
}

/// Check every declared requirement in `phases` under `relation`.
///
/// The reserved runtime floor is not a package and is skipped. Comparison
/// failures (malformed versions on either side) propagate as errors.
pub fn check(
    prereqs: &Prereqs,
    phases: &[Phase],
    relation: Relation,
    probe: &dyn Probe,
) -> Result<Vec<Issue>> {
    let mut issues = Vec::new();
    for phase in phases {
        for (package, required) in prereqs.packages(*phase, relation) {
            if package == RUNTIME_PACKAGE {
                continue;
            }
            match probe.installed_version(package)? {
                None => issues.push(Issue::Missing {
                    package: package.to_string(),
                }),
                Some(installed) => {
                    if version::compare(&installed, required)? == std::cmp::Ordering::Less {
                        issues.push(Issue::Outdated {
                            package: package.to_string(),
                            installed,
                            required: required.to_string(),
                        });
                    }
                }
            }
        }
    }
    Ok(issues)
}

/// Resolve verification findings.
///
/// Missing packages are installed synchronously when auto-install is on; a
/// failed install subprocess aborts the run. Every other finding is printed
/// as a warning and the run continues.
pub fn resolve(
    issues: Vec<Issue>,
    auto_install: bool,
    installer: &str,
    runner: &Runner<'_>,
    output: &OutputManager,
) -> Result<()> {
    for issue in issues {
        match issue {
            Issue::Missing { package } if auto_install => {
                output.info(&format!("installing missing dependency {package}"));
                runner.run(
                    &[
                        installer.to_string(),
                        "install".to_string(),
                        package.clone(),
                    ],
                    &[],
                )?;
            }
            Issue::Missing { package } => {
                output.warn(&format!("{package} is not installed"));
            }
            Issue::Outdated {
                package,
                installed,
                required,
            } => {
                output.warn(&format!(
                    "{package} is outdated: installed {installed}, required {required}"
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeProbe(HashMap<&'static str, &'static str>);

    impl Probe for FakeProbe {
        fn installed_version(&self, package: &str) -> Result<Option<String>> {
            Ok(self.0.get(package).map(|v| v.to_string()))
        }
    }

    fn spec() -> Prereqs {
        let mut prereqs = Prereqs::default();
        for (pkg, floor) in [("Baz", "1.0.0"), ("Qux", "2.0.0"), ("Ok", "0.5")] {
            prereqs
                .register(Phase::Runtime, Relation::Requires, pkg, floor)
                .unwrap();
        }
        prereqs
            .register(Phase::Runtime, Relation::Requires, RUNTIME_PACKAGE, "1.4")
            .unwrap();
        prereqs
    }

    #[test]
    fn classifies_missing_outdated_and_satisfied() {
        let probe = FakeProbe(HashMap::from([("Qux", "1.9.0"), ("Ok", "0.6.0")]));
        let issues = check(&spec(), &[Phase::Runtime], Relation::Requires, &probe).unwrap();
        assert_eq!(issues.len(), 2);
        assert!(issues.contains(&Issue::Missing {
            package: "Baz".to_string()
        }));
        assert!(issues.contains(&Issue::Outdated {
            package: "Qux".to_string(),
            installed: "1.9.0".to_string(),
            required: "v2.0.0".to_string(),
        }));
    }

    #[test]
    fn runtime_floor_is_not_probed() {
        let probe = FakeProbe(HashMap::from([
            ("Baz", "1.0.0"),
            ("Qux", "2.0.0"),
            ("Ok", "1.0.0"),
        ]));
        let issues = check(&spec(), &[Phase::Runtime], Relation::Requires, &probe).unwrap();
        assert!(issues.is_empty());
    }

    #[test]
    fn malformed_installed_version_propagates() {
        let probe = FakeProbe(HashMap::from([
            ("Baz", "garbage"),
            ("Qux", "2.0.0"),
            ("Ok", "1.0.0"),
        ]));
        assert!(check(&spec(), &[Phase::Runtime], Relation::Requires, &probe).is_err());
    }

    #[test]
    fn unverified_phase_yields_no_issues() {
        let probe = FakeProbe(HashMap::new());
        let issues = check(&spec(), &[Phase::Develop], Relation::Requires, &probe).unwrap();
        assert!(issues.is_empty());
    }

    #[cfg(unix)]
    fn fake_installer(dir: &std::path::Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fake-installer");
        std::fs::write(&path, body).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.display().to_string()
    }

    #[test]
    #[cfg(unix)]
    fn auto_install_invokes_the_installer_for_missing_packages() {
        use crate::cli::output::ColorPreference;

        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls");
        let installer = fake_installer(
            dir.path(),
            &format!("#!/bin/sh\necho \"$@\" >> '{}'\n", log.display()),
        );

        let output = OutputManager::new(ColorPreference::Never, false);
        let runner = Runner::new(&output);
        let issues = vec![Issue::Missing {
            package: "Baz".to_string(),
        }];
        resolve(issues, true, &installer, &runner, &output).unwrap();

        let calls = std::fs::read_to_string(&log).unwrap();
        assert_eq!(calls.trim(), "install Baz");
    }

    #[test]
    #[cfg(unix)]
    fn failed_install_aborts_the_run() {
        use crate::cli::output::ColorPreference;
        use crate::error::DistError;

        let dir = tempfile::tempdir().unwrap();
        let installer = fake_installer(dir.path(), "#!/bin/sh\nexit 3\n");

        let output = OutputManager::new(ColorPreference::Never, false);
        let runner = Runner::new(&output);
        let issues = vec![Issue::Missing {
            package: "Baz".to_string(),
        }];
        assert!(matches!(
            resolve(issues, true, &installer, &runner, &output),
            Err(DistError::AlreadyReported)
        ));
    }
}
