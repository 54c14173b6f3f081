//! Slideshow configuration file loading and validation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::Error;

/// Lowest delay between slides, in milliseconds.
pub const MIN_DELAY_MS: u64 = 250;

/// Delay used before any configuration has been applied.
pub const DEFAULT_DELAY_MS: u64 = 3_000;

const DEFAULT_DELAY_SECONDS: f64 = 3.0;

/// Validated contents of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideshowConfig {
    /// Absolute, user-expanded image folder.
    pub folder_path: PathBuf,
    /// Delay between slides, already clamped to [`MIN_DELAY_MS`].
    pub delay_ms: u64,
}

/// Fields are kept loosely typed so validation, not serde, words the errors.
/// `None` means the key was absent; an explicit `null` is `Some(Value::Null)`.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default, alias = "folder-path", deserialize_with = "present")]
    folder_path: Option<Value>,
    #[serde(default, alias = "delay-seconds", deserialize_with = "present")]
    delay_seconds: Option<Value>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl SlideshowConfig {
    /// Read and validate the configuration at `path`.
    ///
    /// Files ending in `.yaml`/`.yml` are parsed as YAML, everything else as JSON.
    ///
    /// # Errors
    /// [`Error::ConfigNotFound`] when the file is absent, [`Error::ConfigMalformed`]
    /// when it cannot be parsed or a field fails validation.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(Error::ConfigNotFound(path.to_path_buf()));
            }
            Err(err) => return Err(err.into()),
        };
        let raw: RawConfig = if is_yaml(path) {
            serde_yaml::from_slice(&data)
                .map_err(|err| Error::ConfigMalformed(format!("invalid config file: {err}")))?
        } else {
            serde_json::from_slice(&data)
                .map_err(|err| Error::ConfigMalformed(format!("invalid config file: {err}")))?
        };
        raw.validated()
    }
}

impl RawConfig {
    fn validated(self) -> Result<SlideshowConfig, Error> {
        let folder = match self.folder_path {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        let folder = folder.trim();
        if folder.is_empty() {
            return Err(Error::ConfigMalformed(
                "folder_path is required in config".into(),
            ));
        }

        let seconds = match self.delay_seconds {
            None => DEFAULT_DELAY_SECONDS,
            Some(value) => seconds_from_value(&value).ok_or_else(|| {
                Error::ConfigMalformed("delay_seconds must be a number".into())
            })?,
        };
        if seconds <= 0.0 {
            return Err(Error::ConfigMalformed(
                "delay_seconds must be greater than 0".into(),
            ));
        }

        Ok(SlideshowConfig {
            folder_path: resolve_folder(folder),
            delay_ms: delay_ms_from_seconds(seconds),
        })
    }
}

/// Numbers, numeric strings and booleans (as 0/1). Anything else, `null`
/// included, is rejected, as are non-finite results.
fn seconds_from_value(value: &Value) -> Option<f64> {
    let seconds = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    seconds.is_finite().then_some(seconds)
}

/// Convert seconds to milliseconds, rounding half to even and applying the floor.
#[must_use]
pub fn delay_ms_from_seconds(seconds: f64) -> u64 {
    let ms = (seconds * 1000.0).round_ties_even();
    // `as` saturates, so absurdly large delays pin to u64::MAX.
    (ms as u64).max(MIN_DELAY_MS)
}

/// Validate a client-supplied delay value.
///
/// Accepts JSON integers, floats (truncated toward zero) and integer strings.
///
/// # Errors
/// [`Error::DelayNotInteger`] for anything else, [`Error::DelayTooShort`] below
/// [`MIN_DELAY_MS`].
pub fn parse_delay_input(value: Option<&Value>) -> Result<u64, Error> {
    let ms: i64 = match value {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => i,
            None => match n.as_f64() {
                Some(f) if f.is_finite() => f.trunc() as i64,
                _ => return Err(Error::DelayNotInteger),
            },
        },
        Some(Value::String(s)) => s.trim().parse().map_err(|_| Error::DelayNotInteger)?,
        Some(Value::Bool(b)) => i64::from(*b),
        _ => return Err(Error::DelayNotInteger),
    };
    if ms < MIN_DELAY_MS as i64 {
        return Err(Error::DelayTooShort);
    }
    Ok(ms as u64)
}

fn resolve_folder(raw: &str) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(raw).as_ref());
    let absolute = std::path::absolute(&expanded).unwrap_or(expanded);
    fs::canonicalize(&absolute).unwrap_or(absolute)
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}
