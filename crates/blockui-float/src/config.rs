#![forbid(unsafe_code)]

//! Floating handle configuration.
//!
//! [`FloatingConfig`] carries the optional derivations a host can supply.
//! Each one is a pure function of a [`DerivationContext`] and overrides one
//! default:
//!
//! | Derivation        | Default when absent                     |
//! |-------------------|-----------------------------------------|
//! | `get_offset`      | no offset rule in the chain             |
//! | `get_position`    | the active node's on-screen rectangle   |
//! | `get_placement`   | [`Placement::Left`]                     |
//! | `extra_middleware`| nothing appended after built-in rules   |
//! | `solver_options`  | [`SolverOverrides::default`]            |
//! | `root_container`  | the surface's default container         |
//!
//! [`HandleSettings`] is the data-only subset that can be loaded from TOML or
//! JSON and turned into a config with [`HandleSettings::into_config`].
//!
//! ```toml
//! placement = "left"
//! offset = 8.0
//! stale = "cancel"
//! init_max_attempts = 20
//! ```

use std::fmt;
use std::path::Path;
use std::rc::Rc;

use blockui_core::{ActiveNode, EditorSurface, ElementRef, Rect, UiElement};
use serde::{Deserialize, Serialize};

use crate::middleware::Middleware;
use crate::placement::Placement;
use crate::solver::SolverOverrides;

/// Inputs available to every derivation.
pub struct DerivationContext<'a> {
    pub active: &'a ActiveNode,
    pub surface: &'a dyn EditorSurface,
    pub floating: &'a dyn UiElement,
}

pub type OffsetFn = Rc<dyn Fn(&DerivationContext<'_>) -> f64>;
pub type PositionFn = Rc<dyn Fn(&DerivationContext<'_>) -> Rect>;
pub type PlacementFn = Rc<dyn Fn(&DerivationContext<'_>) -> Placement>;
pub type MiddlewareFn = Rc<dyn Fn(&DerivationContext<'_>) -> Vec<Middleware>>;
pub type OverridesFn = Rc<dyn Fn(&DerivationContext<'_>) -> SolverOverrides>;

/// What to do with an in-flight position computation when a newer
/// `show` or `hide` arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StalePolicy {
    /// Drop the older result when it lands.
    #[default]
    Cancel,
    /// Apply every result as it lands, even after a later hide.
    Keep,
}

/// How many times deferred initialization may fail before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InitPolicy {
    /// `None` retries on every `update()` forever.
    pub max_attempts: Option<u32>,
}

impl InitPolicy {
    /// Retry silently forever.
    pub const fn unbounded() -> Self {
        Self { max_attempts: None }
    }

    /// Give up, with a diagnostic, after `attempts` failures.
    pub const fn bounded(attempts: u32) -> Self {
        Self {
            max_attempts: Some(attempts),
        }
    }

    /// Whether `failures` consecutive failures exhaust the policy.
    pub fn exhausted(&self, failures: u32) -> bool {
        self.max_attempts.is_some_and(|max| failures >= max)
    }
}

/// Optional overrides for the floating handle controller.
#[derive(Clone, Default)]
pub struct FloatingConfig {
    pub get_offset: Option<OffsetFn>,
    pub get_position: Option<PositionFn>,
    pub get_placement: Option<PlacementFn>,
    pub extra_middleware: Option<MiddlewareFn>,
    pub solver_options: Option<OverridesFn>,
    pub root_container: Option<ElementRef>,
    pub stale: StalePolicy,
    pub init: InitPolicy,
}

impl FloatingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn offset(mut self, f: impl Fn(&DerivationContext<'_>) -> f64 + 'static) -> Self {
        self.get_offset = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn position(mut self, f: impl Fn(&DerivationContext<'_>) -> Rect + 'static) -> Self {
        self.get_position = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn placement(mut self, f: impl Fn(&DerivationContext<'_>) -> Placement + 'static) -> Self {
        self.get_placement = Some(Rc::new(f));
        self
    }

    /// Rules appended after the built-in flip and offset.
    #[must_use]
    pub fn middleware(
        mut self,
        f: impl Fn(&DerivationContext<'_>) -> Vec<Middleware> + 'static,
    ) -> Self {
        self.extra_middleware = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn solver_options(
        mut self,
        f: impl Fn(&DerivationContext<'_>) -> SolverOverrides + 'static,
    ) -> Self {
        self.solver_options = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn root(mut self, container: ElementRef) -> Self {
        self.root_container = Some(container);
        self
    }

    #[must_use]
    pub fn stale_policy(mut self, stale: StalePolicy) -> Self {
        self.stale = stale;
        self
    }

    #[must_use]
    pub fn init_policy(mut self, init: InitPolicy) -> Self {
        self.init = init;
        self
    }
}

impl fmt::Debug for FloatingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FloatingConfig")
            .field("get_offset", &self.get_offset.is_some())
            .field("get_position", &self.get_position.is_some())
            .field("get_placement", &self.get_placement.is_some())
            .field("extra_middleware", &self.extra_middleware.is_some())
            .field("solver_options", &self.solver_options.is_some())
            .field(
                "root_container",
                &self.root_container.as_ref().map(|el| el.id()),
            )
            .field("stale", &self.stale)
            .field("init", &self.init)
            .finish()
    }
}

/// Errors loading [`HandleSettings`].
#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Json(serde_json::Error),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "settings I/O: {err}"),
            Self::Toml(err) => write!(f, "settings TOML: {err}"),
            Self::Json(err) => write!(f, "settings JSON: {err}"),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Toml(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<toml::de::Error> for SettingsError {
    fn from(err: toml::de::Error) -> Self {
        Self::Toml(err)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Data-only handle settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandleSettings {
    /// Preferred side.
    pub placement: Placement,
    /// Fixed distance from the reference; no offset rule when absent.
    pub offset: Option<f64>,
    /// Stale computation handling.
    pub stale: StalePolicy,
    /// Initialization failures tolerated before giving up; unbounded when absent.
    pub init_max_attempts: Option<u32>,
}

impl Default for HandleSettings {
    fn default() -> Self {
        Self {
            placement: Placement::Left,
            offset: None,
            stale: StalePolicy::Cancel,
            init_max_attempts: None,
        }
    }
}

impl HandleSettings {
    /// Parse from a TOML document.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Toml`] on malformed input.
    pub fn from_toml_str(s: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(s)?)
    }

    /// Parse from a JSON document.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Json`] on malformed input.
    pub fn from_json_str(s: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a file, choosing the format by extension (`.json` or TOML).
    ///
    /// # Errors
    ///
    /// I/O or parse failures.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_toml_str(&text),
        }
    }

    /// Build a config whose derivations return these constants.
    pub fn into_config(self) -> FloatingConfig {
        let placement = self.placement;
        let init = self.init_max_attempts.map_or(InitPolicy::unbounded(), InitPolicy::bounded);
        let mut config = FloatingConfig::new()
            .placement(move |_| placement)
            .stale_policy(self.stale)
            .init_policy(init);
        if let Some(offset) = self.offset {
            config = config.offset(move |_| offset);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let settings = HandleSettings::from_toml_str("").unwrap();
        assert_eq!(settings, HandleSettings::default());
    }

    #[test]
    fn toml_overrides_fields() {
        let settings = HandleSettings::from_toml_str(
            r#"
            placement = "right"
            offset = 12.5
            stale = "keep"
            init_max_attempts = 3
            "#,
        )
        .unwrap();
        assert_eq!(settings.placement, Placement::Right);
        assert_eq!(settings.offset, Some(12.5));
        assert_eq!(settings.stale, StalePolicy::Keep);
        assert_eq!(settings.init_max_attempts, Some(3));
    }

    #[test]
    fn json_partial_document() {
        let settings = HandleSettings::from_json_str(r#"{"placement":"top"}"#).unwrap();
        assert_eq!(settings.placement, Placement::Top);
        assert_eq!(settings.offset, None);
    }

    #[test]
    fn bad_toml_is_reported() {
        let err = HandleSettings::from_toml_str("placement = \"sideways\"").unwrap_err();
        assert!(matches!(err, SettingsError::Toml(_)));
        assert!(err.to_string().starts_with("settings TOML"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = HandleSettings::from_file("/nonexistent/blockui-handle.toml").unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
    }

    #[test]
    fn into_config_sets_derivations() {
        let config = HandleSettings {
            offset: Some(4.0),
            init_max_attempts: Some(2),
            ..HandleSettings::default()
        }
        .into_config();
        assert!(config.get_offset.is_some());
        assert!(config.get_placement.is_some());
        assert!(config.get_position.is_none());
        assert_eq!(config.init, InitPolicy::bounded(2));
    }

    #[test]
    fn into_config_without_offset_has_no_offset_rule() {
        let config = HandleSettings::default().into_config();
        assert!(config.get_offset.is_none());
        assert_eq!(config.stale, StalePolicy::Cancel);
    }

    #[test]
    fn init_policy_exhaustion() {
        assert!(!InitPolicy::unbounded().exhausted(1_000));
        let bounded = InitPolicy::bounded(3);
        assert!(!bounded.exhausted(2));
        assert!(bounded.exhausted(3));
    }
}
