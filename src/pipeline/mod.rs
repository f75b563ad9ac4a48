//! Pipeline orchestration.
//!
//! Coordinates configuration resolution, implicit requirement merging,
//! plugin loading, dependency verification, staging, and the per-command
//! stage sequences. The working-directory guard and the scratch-root
//! reclamation run on every exit path.

use std::path::{Path, PathBuf};

use crate::cli::args::{Args, Command};
use crate::cli::output::OutputManager;
use crate::config::{
    FileModuleProbe, ProjectConfig, CHANGES_FILE, CONFIG_FILE, PREREQS_FILE,
};
use crate::error::{DistError, Result};
use crate::exec::{split_command, Runner};
use crate::plugin::{self, HookBus, AFTER_STAGE};
use crate::prereqs::{version, Phase, Prereqs, Relation};
use crate::verify::{self, CommandProbe};
use crate::workdir::{self, DirGuard};
use crate::{config, dist};

/// Implicit configure-time requirement merged into every run: the core
/// build support this generator emits scripts for.
pub const CORE_PACKAGE: &str = "distkit-core";

/// Floor for [`CORE_PACKAGE`]; tracks the generator's own version.
pub const CORE_FLOOR: &str = concat!("v", env!("CARGO_PKG_VERSION"));

/// External registry uploader invoked by the release sequence.
pub const UPLOADER: &str = "distkit-upload";

/// Policy flags resolved from the CLI for one run.
#[derive(Clone, Copy, Debug, Default)]
pub struct Flags {
    /// Keep the scratch root for inspection.
    pub debug: bool,
    /// Install missing requirements through the external installer.
    pub auto_install: bool,
    /// Run the test suite during the dist-building sequence.
    pub run_tests: bool,
}

/// Mutable shared state of one pipeline run, passed to plugins and hooks.
pub struct Build {
    pub config: ProjectConfig,
    pub prereqs: Prereqs,
    /// The caller's project root; the archive is written here.
    pub root: PathBuf,
    pub flags: Flags,
}

impl Build {
    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Build {
            config: ProjectConfig {
                name: "Test-Dist".to_string(),
                version: "v0.0.1".to_string(),
                abstract_: "test fixture".to_string(),
                author: "nobody".to_string(),
                license: "MIT".to_string(),
                copyright_holder: None,
                main_module: "Test::Dist".to_string(),
                test_command: None,
                installer: None,
                scripts: Vec::new(),
                plugins: Vec::new(),
            },
            prereqs: Prereqs::default(),
            root: PathBuf::from("."),
            flags: Flags::default(),
        }
    }
}

/// Interactive questions asked of the operator, behind a seam like the
/// config module's probe so the release flow works without a terminal.
pub trait Prompter {
    /// Show `message` and return the trimmed answer.
    fn ask(&self, message: &str) -> Result<String>;
}

/// Stdin-backed prompter used by the binary.
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn ask(&self, message: &str) -> Result<String> {
        use std::io::Write;
        print!("{message}");
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}

/// Top-level pipeline entry point.
///
/// Runs the requested command against the current directory and reclaims
/// the scratch root afterwards (successfully or not) unless debug mode
/// asked for retention.
pub fn run(args: &Args, output: &OutputManager) -> Result<()> {
    run_with(args, output, &StdinPrompter)
}

/// [`run`] with an explicit prompter, for non-interactive callers.
pub fn run_with(args: &Args, output: &OutputManager, prompter: &dyn Prompter) -> Result<()> {
    if let Command::New { module } = &args.command {
        return scaffold(module, output);
    }

    let root = std::env::current_dir()?;
    let result = execute(args, &root, output, prompter);

    if args.debug {
        output.verbose(&format!(
            "debug: keeping {}",
            root.join(workdir::SCRATCH_DIR).display()
        ));
    } else if let Err(e) = workdir::cleanup(&root) {
        // Cleanup must not mask the stage outcome.
        log::warn!("failed to remove scratch root: {e}");
    }
    result
}

fn execute(
    args: &Args,
    root: &Path,
    output: &OutputManager,
    prompter: &dyn Prompter,
) -> Result<()> {
    let runner = Runner::new(output);

    let config = ProjectConfig::load(root, &FileModuleProbe, output)?;
    let mut prereqs = Prereqs::load(&root.join(PREREQS_FILE))?;
    prereqs.register(Phase::Configure, Relation::Requires, CORE_PACKAGE, CORE_FLOOR)?;

    let flags = Flags {
        debug: args.debug,
        auto_install: args.auto_install(),
        run_tests: wants_tests(&args.command),
    };
    let mut build = Build {
        config,
        prereqs,
        root: root.to_path_buf(),
        flags,
    };

    let mut hooks = HookBus::default();
    for (name, payload) in build.config.plugins.clone() {
        plugin::load(&name, &payload, &mut build, &mut hooks)?;
    }

    let installer = build.config.installer().to_string();
    let probe = CommandProbe::new(runner, &installer);
    let issues = verify::check(
        &build.prereqs,
        &verified_phases(&build.flags),
        Relation::Requires,
        &probe,
    )?;
    verify::resolve(issues, build.flags.auto_install, &installer, &runner, output)?;

    if matches!(args.command, Command::Release { .. }) {
        release_preamble(&mut build, output, prompter)?;
    }

    let files = dist::gather(&build.root, &runner)?;
    let work = workdir::stage(&files, &build.root)?;

    let guard = DirGuard::enter(&work.dir)?;
    let result = run_stage(
        &args.command,
        &mut build,
        &hooks,
        &files,
        &runner,
        output,
        prompter,
    );
    drop(guard);
    result
}

/// Whether the invoked command runs the test suite.
fn wants_tests(command: &Command) -> bool {
    match command {
        Command::Test => true,
        Command::Dist { test }
        | Command::Install { test, .. }
        | Command::Release { test } => test.enabled(),
        Command::New { .. } => false,
    }
}

/// Phases verified for this run: configure, build and runtime always, plus
/// test when the suite will run. Develop requirements are never verified.
fn verified_phases(flags: &Flags) -> Vec<Phase> {
    let mut phases = vec![Phase::Configure, Phase::Build];
    if flags.run_tests {
        phases.push(Phase::Test);
    }
    phases.push(Phase::Runtime);
    phases
}

fn run_stage(
    command: &Command,
    build: &mut Build,
    hooks: &HookBus,
    files: &[PathBuf],
    runner: &Runner<'_>,
    output: &OutputManager,
    prompter: &dyn Prompter,
) -> Result<()> {
    hooks.fire(AFTER_STAGE, build, &[])?;

    match command {
        Command::Test => run_test_command(build, runner, false),
        Command::Dist { .. } => {
            dist_sequence(build, files, runner, output)?;
            Ok(())
        }
        Command::Install { keep_archive, .. } => {
            let archive = dist_sequence(build, files, runner, output)?;
            let installer = build.config.installer().to_string();
            runner.run(
                &[installer, "install".to_string(), archive.display().to_string()],
                &[],
            )?;
            if !*keep_archive {
                std::fs::remove_file(&archive)?;
                output.verbose(&format!("removed {}", archive.display()));
            }
            Ok(())
        }
        Command::Release { .. } => {
            let archive = dist_sequence(build, files, runner, output)?;
            let question = format!("upload {} to the registry? [y/N] ", archive.display());
            if !confirm(prompter, &question)? {
                output.info("upload skipped");
                return Ok(());
            }
            runner.run(
                &[UPLOADER.to_string(), archive.display().to_string()],
                &[],
            )?;
            output.success(&format!("released {}", build.config.dist_name()));
            Ok(())
        }
        Command::New { .. } => unreachable!("handled before staging"),
    }
}

/// The dist-building sequence: artifacts, optional release-grade test run,
/// then the archive, which lands in the project root. The build script and
/// license persist in the project root afterwards.
fn dist_sequence(
    build: &Build,
    files: &[PathBuf],
    runner: &Runner<'_>,
    output: &OutputManager,
) -> Result<PathBuf> {
    let manifest = dist::generate(files, &build.config, &build.prereqs)?;
    if build.flags.run_tests {
        run_test_command(build, runner, true)?;
    }
    let archive = dist::archive::build(&manifest, &build.config.dist_name(), &build.root)?;
    let staging = std::env::current_dir()?;
    dist::persist(&staging, &build.root)?;
    output.success(&format!("wrote {}", archive.display()));
    Ok(archive)
}

/// Run the configured test command as a blocking subprocess; non-zero exit
/// is fatal. Release-grade runs advertise themselves in the environment.
fn run_test_command(build: &Build, runner: &Runner<'_>, release_grade: bool) -> Result<()> {
    let argv = split_command(build.config.test_command());
    let envs: &[(&str, &str)] = if release_grade {
        &[("RELEASE_TESTING", "1")]
    } else {
        &[]
    };
    runner.run(&argv, envs)
}

/// Version bump and changelog confirmation, before anything is staged.
fn release_preamble(
    build: &mut Build,
    output: &OutputManager,
    prompter: &dyn Prompter,
) -> Result<()> {
    let current = build.config.version.clone();
    let answer = prompter.ask(&format!("release version [{current}]: "))?;
    let next = if answer.is_empty() {
        current.clone()
    } else {
        version::normalize(&answer)
    };
    version::parse_floor(&next)?;

    let changes_path = build.root.join(CHANGES_FILE);
    let changes = match std::fs::read_to_string(&changes_path) {
        Ok(changes) => changes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            output.error(&format!(
                "{} not found; a release needs a changelog entry",
                changes_path.display()
            ));
            return Err(DistError::AlreadyReported);
        }
        Err(e) => return Err(e.into()),
    };
    let bare = next.strip_prefix('v').unwrap_or(&next);
    if !changes.lines().any(|line| line.contains(bare)) {
        output.error(&format!("no entry for {next} in {CHANGES_FILE}"));
        return Err(DistError::AlreadyReported);
    }

    if next != current {
        rewrite_version(&build.root, &next, output)?;
        build.config.version = next;
    }
    Ok(())
}

/// Rewrite the `version` key in the project descriptor, if it has one.
fn rewrite_version(root: &Path, next: &str, output: &OutputManager) -> Result<()> {
    let path = root.join(CONFIG_FILE);
    let raw = std::fs::read_to_string(&path)?;
    let pattern = regex::Regex::new(r#"(?m)^(version\s*=\s*")[^"]*(")"#)
        .expect("valid pattern");
    if pattern.is_match(&raw) {
        let rewritten = pattern
            .replace(&raw, |caps: &regex::Captures<'_>| {
                format!("{}{}{}", &caps[1], next, &caps[2])
            })
            .into_owned();
        std::fs::write(&path, rewritten)?;
        output.info(&format!("bumped {CONFIG_FILE} version to {next}"));
    } else {
        output.warn(&format!(
            "{CONFIG_FILE} declares no version; bump the primary module instead"
        ));
    }
    Ok(())
}

fn confirm(prompter: &dyn Prompter, message: &str) -> Result<bool> {
    let answer = prompter.ask(message)?.to_lowercase();
    Ok(matches!(answer.as_str(), "y" | "yes"))
}

/// Minimal non-interactive project scaffold.
pub fn scaffold(module: &str, output: &OutputManager) -> Result<()> {
    let name = module.replace("::", "-");
    let root = PathBuf::from(&name);
    if root.exists() {
        output.error(&format!("{name} already exists"));
        return Err(DistError::AlreadyReported);
    }

    let module_file = root.join(config::module_path(module));
    std::fs::create_dir_all(module_file.parent().expect("module path has a parent"))?;
    std::fs::write(
        &module_file,
        format!(
            "# VERSION: 0.0.1\n# ABSTRACT: {module} is yet to be described\n\n"
        ),
    )?;
    std::fs::write(
        root.join(CONFIG_FILE),
        format!(
            "main_module = \"{module}\"\nauthor = \"\"\nlicense = \"MIT\"\n"
        ),
    )?;
    std::fs::write(
        root.join(PREREQS_FILE),
        "[runtime.requires]\n\n[test.requires]\n",
    )?;
    std::fs::write(root.join(CHANGES_FILE), "v0.0.1\n    - initial release\n")?;

    output.success(&format!("created {name}"));
    Ok(())
}
