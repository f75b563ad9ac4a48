//! Named extension plugins and the per-run hook bus.
//!
//! Plugins are resolved by identifier at load time, initialized once per
//! pipeline run in configuration order, and may register hook callbacks
//! during initialization only. The bus is owned by the run context; there is
//! no process-global trigger table.

pub mod prune;

use std::collections::BTreeMap;

use crate::error::{DistError, Result};
use crate::pipeline::Build;

/// Default namespace bare plugin names resolve against.
pub const NAMESPACE: &str = "distkit::plugin::";

/// Prefix that opts a name out of the default namespace.
pub const VERBATIM_PREFIX: char = '+';

/// Hook fired once after the working copy has been staged and entered.
pub const AFTER_STAGE: &str = "after_stage";

/// A registered hook callback: orchestrator plus extra arguments.
pub type HookFn = Box<dyn Fn(&mut Build, &[String]) -> Result<()>>;

/// Ordered hook callbacks, keyed by hook name.
///
/// Populated during plugin loading; callbacks are never removed mid-run and
/// must tolerate being called zero or more times.
#[derive(Default)]
pub struct HookBus {
    hooks: BTreeMap<String, Vec<HookFn>>,
}

impl HookBus {
    /// Append a callback to the named hook's list.
    pub fn add(&mut self, hook: &str, callback: HookFn) {
        self.hooks.entry(hook.to_string()).or_default().push(callback);
    }

    /// Invoke every callback registered for `hook`, in registration order.
    pub fn fire(&self, hook: &str, build: &mut Build, args: &[String]) -> Result<()> {
        let Some(callbacks) = self.hooks.get(hook) else {
            return Ok(());
        };
        log::debug!("firing {hook} ({} callbacks)", callbacks.len());
        for callback in callbacks {
            callback(build, args)?;
        }
        Ok(())
    }

    /// Number of callbacks registered for `hook`.
    pub fn registered(&self, hook: &str) -> usize {
        self.hooks.get(hook).map_or(0, Vec::len)
    }
}

/// A loadable extension point.
///
/// `init` runs once at load time with the orchestrator, the run's hook bus,
/// and the plugin's configuration payload from the project descriptor.
pub trait Plugin {
    fn init(&self, build: &mut Build, hooks: &mut HookBus, payload: &toml::Value) -> Result<()>;
}

/// Resolve a configured plugin name to its full identifier.
///
/// Bare names go through [`NAMESPACE`]; a [`VERBATIM_PREFIX`] escapes to the
/// given fully-qualified identifier.
pub fn resolve(name: &str) -> String {
    match name.strip_prefix(VERBATIM_PREFIX) {
        Some(full) => full.to_string(),
        None => format!("{NAMESPACE}{name}"),
    }
}

fn builtin(resolved: &str) -> Option<Box<dyn Plugin>> {
    match resolved {
        "distkit::plugin::PruneFiles" => Some(Box::new(prune::PruneFiles)),
        _ => None,
    }
}

/// Resolve and initialize one plugin registration.
///
/// Resolution failure is fatal and aborts the run.
pub fn load(
    name: &str,
    payload: &toml::Value,
    build: &mut Build,
    hooks: &mut HookBus,
) -> Result<()> {
    let resolved = resolve(name);
    let Some(plugin) = builtin(&resolved) else {
        return Err(DistError::PluginNotFound { name: resolved });
    };
    log::info!("loading plugin {resolved}");
    plugin.init(build, hooks, payload)
}
