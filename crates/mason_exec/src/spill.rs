//! Temp-file substitution for overlong command lines.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;
use tempfile::NamedTempFile;

use crate::error::ExecError;
use crate::escape::{posix_escape, ArgEscape};

/// Default maximum expanded command-line length in bytes.
const DEFAULT_MAX_LINE_LENGTH: usize = 128 * 1024;

/// Settings controlling when and how command lines are spilled.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpillConfig {
    /// Maximum length of the expanded command line. The spill mechanism
    /// kicks in only above this length, never at it.
    pub max_line_length: usize,

    /// Separator written between spilled arguments.
    pub arg_join: String,

    /// Prefix prepended to the argument file path in the rewritten
    /// invocation (conventionally `@`).
    pub prefix: String,
}

impl Default for SpillConfig {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            arg_join: "\n".to_string(),
            prefix: "@".to_string(),
        }
    }
}

/// A materialized argument file and the rewritten invocation that uses it.
///
/// The temporary file lives as long as this entry is cached, so the
/// rewritten invocation stays valid for the rest of the run.
struct SpilledCommand {
    argv: Vec<String>,
    _file: NamedTempFile,
}

/// Rewrites overlong command lines to pass arguments via a temporary file.
///
/// Keyed by target node identity and the expanded command, so the same
/// overflowed command is only materialized once per target; subsequent
/// requests reuse the cached file and argument list.
pub struct CommandSpiller {
    config: SpillConfig,
    escape: ArgEscape,
    cache: Mutex<HashMap<(String, String), Arc<SpilledCommand>>>,
}

impl CommandSpiller {
    /// Creates a spiller with the given settings and the default
    /// [`posix_escape`] argument escape.
    pub fn new(config: SpillConfig) -> Self {
        Self {
            config,
            escape: posix_escape,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Replaces the argument escape function.
    pub fn with_escape(mut self, escape: ArgEscape) -> Self {
        self.escape = escape;
        self
    }

    /// Returns the command to execute for `argv`, spilling if necessary.
    ///
    /// If the expanded command line fits within the configured maximum, the
    /// original `argv` is returned unchanged. Otherwise `argv[1..]` is
    /// escaped, joined with the configured separator, written to a
    /// temporary file, and the result is `[argv[0], "<prefix><path>"]`.
    pub fn spill(&self, target: &str, argv: &[String]) -> Result<Vec<String>, ExecError> {
        if argv.is_empty() {
            return Ok(Vec::new());
        }

        let expanded = argv.join(" ");
        if expanded.len() <= self.config.max_line_length {
            return Ok(argv.to_vec());
        }

        let key = (target.to_string(), expanded);
        if let Some(hit) = self.cache.lock().get(&key) {
            return Ok(hit.argv.clone());
        }

        // Materialize without holding the lock so unrelated targets don't
        // serialize on each other's disk I/O.
        let mut file = NamedTempFile::new().map_err(|e| ExecError::ArgFile {
            target: target.to_string(),
            source: e,
        })?;
        let escaped: Vec<String> = argv[1..].iter().map(|arg| (self.escape)(arg)).collect();
        file.write_all(escaped.join(&self.config.arg_join).as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| ExecError::ArgFile {
                target: target.to_string(),
                source: e,
            })?;

        tracing::debug!(
            node = target,
            length = key.1.len(),
            limit = self.config.max_line_length,
            file = %file.path().display(),
            "command line exceeds limit, spilling arguments"
        );

        let spilled = Arc::new(SpilledCommand {
            argv: vec![
                argv[0].clone(),
                format!("{}{}", self.config.prefix, file.path().display()),
            ],
            _file: file,
        });

        // Insert-if-absent: a racing call for the same key may have won in
        // the meantime; everyone returns the cached entry, and a losing
        // duplicate file is dropped here.
        let entry = Arc::clone(self.cache.lock().entry(key).or_insert(spilled));
        Ok(entry.argv.clone())
    }

    /// Returns the number of materialized argument files held for the run.
    pub fn cached_count(&self) -> usize {
        self.cache.lock().len()
    }
}
