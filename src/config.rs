//! Framework options: the defaults table and the current overlay on top.
//!
//! Option names follow the kebab-case keys hosts already use
//! (`link-class`, `cache-lifetime`, ...), both in YAML files and in
//! [`Config::option`] lookups.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CallError, ConfigError};
use crate::execute::execute_optional;

/// Environment variable naming a YAML overlay file.
pub const CONFIG_ENV: &str = "SPF_CONFIG";

/// Fully resolved options. `Config::default()` is the defaults table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Query appended to navigation URLs; `__type__` is replaced by the
    /// request type.
    pub url_identifier: String,
    /// Class marking links the framework should handle.
    pub link_class: String,
    /// Class marking links the framework must leave alone.
    pub nolink_class: String,
    /// Request timeout in milliseconds; 0 disables it.
    pub request_timeout: u64,
    /// How long cached responses stay valid, in milliseconds.
    pub cache_lifetime: u64,
    /// Class applied to content during a transition.
    pub transition_class: String,
    /// Transition length in milliseconds.
    pub transition_duration: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url_identifier: "?spf=__type__".to_string(),
            link_class: "spf-link".to_string(),
            nolink_class: "spf-nolink".to_string(),
            request_timeout: 0,
            cache_lifetime: 600_000,
            transition_class: "spf-transition".to_string(),
            transition_duration: 425,
        }
    }
}

impl Config {
    /// Looks an option up by its table name.
    pub fn option(&self, name: &str) -> Option<Value> {
        match serde_json::to_value(self).ok()? {
            Value::Object(mut map) => map.remove(name),
            _ => None,
        }
    }

    /// `self` with every option set in `overlay` replaced.
    #[must_use]
    pub fn overlay(&self, overlay: &ConfigOverlay) -> Self {
        let defaults = self.clone();
        Self {
            url_identifier: overlay.url_identifier.clone().unwrap_or(defaults.url_identifier),
            link_class: overlay.link_class.clone().unwrap_or(defaults.link_class),
            nolink_class: overlay.nolink_class.clone().unwrap_or(defaults.nolink_class),
            request_timeout: overlay.request_timeout.unwrap_or(defaults.request_timeout),
            cache_lifetime: overlay.cache_lifetime.unwrap_or(defaults.cache_lifetime),
            transition_class: overlay.transition_class.clone().unwrap_or(defaults.transition_class),
            transition_duration: overlay
                .transition_duration
                .unwrap_or(defaults.transition_duration),
        }
    }

    /// The request timeout, or `None` when disabled.
    pub fn request_timeout(&self) -> Option<TimeDelta> {
        (self.request_timeout > 0).then(|| millis(self.request_timeout))
    }

    /// The cache lifetime.
    pub fn cache_lifetime(&self) -> TimeDelta {
        millis(self.cache_lifetime)
    }

    /// The transition length.
    pub fn transition_duration(&self) -> TimeDelta {
        millis(self.transition_duration)
    }
}

fn millis(ms: u64) -> TimeDelta {
    TimeDelta::milliseconds(i64::try_from(ms).unwrap_or(i64::MAX))
}

/// Options a host has set explicitly. Unset options fall through to the
/// defaults table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConfigOverlay {
    /// See [`Config::url_identifier`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_identifier: Option<String>,
    /// See [`Config::link_class`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_class: Option<String>,
    /// See [`Config::nolink_class`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nolink_class: Option<String>,
    /// See [`Config::request_timeout`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// See [`Config::cache_lifetime`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_lifetime: Option<u64>,
    /// See [`Config::transition_class`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition_class: Option<String>,
    /// See [`Config::transition_duration`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition_duration: Option<u64>,
}

impl ConfigOverlay {
    /// Parses an overlay from YAML. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document is malformed or an
    /// option has the wrong type.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Reads an overlay from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_yaml_str(&yaml)
    }

    /// Layers `other` on top: options it sets win.
    pub fn merge(&mut self, other: Self) {
        self.url_identifier = other.url_identifier.or(self.url_identifier.take());
        self.link_class = other.link_class.or(self.link_class.take());
        self.nolink_class = other.nolink_class.or(self.nolink_class.take());
        self.request_timeout = other.request_timeout.or(self.request_timeout);
        self.cache_lifetime = other.cache_lifetime.or(self.cache_lifetime);
        self.transition_class = other.transition_class.or(self.transition_class.take());
        self.transition_duration = other.transition_duration.or(self.transition_duration);
    }
}

/// A lifecycle hook callback. Receives the event payload and returns a
/// value the caller may inspect.
pub type Callback = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Lifecycle points a host can hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    /// A navigation was requested.
    NavigateRequested,
    /// A navigation response arrived.
    NavigateReceived,
    /// A navigation response was applied.
    NavigateProcessed,
    /// A navigation failed.
    NavigateError,
}

impl Hook {
    /// Every hook, in lifecycle order.
    pub const ALL: [Self; 4] =
        [Self::NavigateRequested, Self::NavigateReceived, Self::NavigateProcessed, Self::NavigateError];

    /// The option name of the hook.
    pub fn name(self) -> &'static str {
        match self {
            Self::NavigateRequested => "navigate-requested-callback",
            Self::NavigateReceived => "navigate-received-callback",
            Self::NavigateProcessed => "navigate-processed-callback",
            Self::NavigateError => "navigate-error-callback",
        }
    }
}

/// Callbacks registered for each [`Hook`]; all unset by default.
#[derive(Clone, Default)]
pub struct Hooks {
    requested: Option<Callback>,
    received: Option<Callback>,
    processed: Option<Callback>,
    error: Option<Callback>,
}

impl Hooks {
    /// Registers `callback` for `hook`, replacing any previous one.
    pub fn set<F>(&mut self, hook: Hook, callback: F)
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        *self.slot_mut(hook) = Some(Arc::new(callback));
    }

    /// Unregisters the callback for `hook`.
    pub fn clear(&mut self, hook: Hook) {
        *self.slot_mut(hook) = None;
    }

    /// The callback registered for `hook`.
    pub fn get(&self, hook: Hook) -> Option<&Callback> {
        match hook {
            Hook::NavigateRequested => self.requested.as_ref(),
            Hook::NavigateReceived => self.received.as_ref(),
            Hook::NavigateProcessed => self.processed.as_ref(),
            Hook::NavigateError => self.error.as_ref(),
        }
    }

    /// Runs the callback for `hook` as a protected call.
    ///
    /// `None` if no callback is registered; otherwise the callback's return
    /// value, or the failure it raised.
    pub fn fire(&self, hook: Hook, payload: &Value) -> Option<Result<Value, CallError>> {
        let callback = self.get(hook).map(|cb| move |p: &Value| cb(p));
        execute_optional(callback, payload)
    }

    fn slot_mut(&mut self, hook: Hook) -> &mut Option<Callback> {
        match hook {
            Hook::NavigateRequested => &mut self.requested,
            Hook::NavigateReceived => &mut self.received,
            Hook::NavigateProcessed => &mut self.processed,
            Hook::NavigateError => &mut self.error,
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for hook in Hook::ALL {
            map.entry(&hook.name(), &self.get(hook).map_or("unset", |_| "set"));
        }
        map.finish()
    }
}

/// The configuration a running framework consults: the host's overlay and
/// hooks on top of the defaults table.
#[derive(Debug, Clone, Default)]
pub struct CurrentConfig {
    overlay: ConfigOverlay,
    hooks: Hooks,
}

impl CurrentConfig {
    /// Nothing set: every option resolves to its default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from `overlay`.
    #[must_use]
    pub fn with_overlay(overlay: ConfigOverlay) -> Self {
        Self { overlay, hooks: Hooks::default() }
    }

    /// Loads the overlay file named by `SPF_CONFIG`, if the variable is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the named file cannot be read or parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => {
                tracing::debug!(path = %Path::new(&path).display(), "loading config overlay");
                Ok(Self::with_overlay(ConfigOverlay::from_path(Path::new(&path))?))
            }
            None => Ok(Self::new()),
        }
    }

    /// Sets every option `overlay` sets, keeping the rest.
    pub fn apply(&mut self, overlay: ConfigOverlay) {
        self.overlay.merge(overlay);
    }

    /// Drops every explicitly set option and hook.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Options set explicitly.
    pub fn overlay(&self) -> &ConfigOverlay {
        &self.overlay
    }

    /// Defaults with the overlay applied.
    pub fn effective(&self) -> Config {
        Config::default().overlay(&self.overlay)
    }

    /// Looks up one effective option by name. Hook names resolve to
    /// `null`, as they hold callbacks rather than data.
    pub fn option(&self, name: &str) -> Option<Value> {
        if Hook::ALL.iter().any(|h| h.name() == name) {
            return Some(Value::Null);
        }
        self.effective().option(name)
    }

    /// Registered lifecycle hooks.
    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// Registered lifecycle hooks, for modification.
    pub fn hooks_mut(&mut self) -> &mut Hooks {
        &mut self.hooks
    }
}
