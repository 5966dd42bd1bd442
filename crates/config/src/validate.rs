//! Configuration validation engine.
//!
//! Checks a config file for syntax, unknown or misspelled fields, type errors,
//! and plugin list mistakes that would only surface when the router is built.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};

use strongroom_crypto::software;

use crate::{
    env_subst::substitute_env,
    loader::{find_config_file, parse_config_value},
    schema::StrongroomConfig,
};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "plugins",
    /// "unknown-plugin", "plugin-settings", "file-ref"
    pub category: &'static str,
    /// Dotted path, e.g. "crypto.enabled_plugins[1]"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of validating a configuration file.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

// ── Schema tree for unknown-field detection ─────────────────────────────────

enum KnownKeys {
    /// A struct with fixed field names.
    Struct(HashMap<&'static str, KnownKeys>),
    /// A map with dynamic keys whose values are free-form.
    Map,
    /// Scalar or list value; stop recursion.
    Leaf,
}

fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Leaf, Map, Struct};

    Struct(HashMap::from([(
        "crypto",
        Struct(HashMap::from([
            ("namespace", Leaf),
            ("enabled_plugins", Leaf),
            ("plugins", Map),
        ])),
    )]))
}

// ── Levenshtein distance ────────────────────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Closest candidate within `max_distance` edits, if any.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|&c| (c, levenshtein(needle, c)))
        .filter(|&(_, d)| d > 0 && d <= max_distance)
        .min_by_key(|&(_, d)| d)
        .map(|(c, _)| c)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or discover the default config
/// file location if `path` is `None`.
///
/// `known_plugins` are the names the catalog can build in the configured
/// namespace; `None` skips the name check. An empty slice means the
/// namespace has nothing registered, so every enabled name is an error.
#[must_use]
pub fn validate(path: Option<&Path>, known_plugins: Option<&[&str]>) -> ValidationResult {
    let Some(config_path) = path.map(Path::to_path_buf).or_else(find_config_file) else {
        let mut result = validate_config(&StrongroomConfig::default(), known_plugins);
        result.diagnostics.insert(
            0,
            Diagnostic::new(
                Severity::Info,
                "file-ref",
                "",
                "no config file found; using defaults",
            ),
        );
        return result;
    };

    let mut result = match std::fs::read_to_string(&config_path) {
        Ok(content) => validate_str(&substitute_env(&content), &config_path, known_plugins),
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("failed to read config file: {e}"),
            )],
            config_path: None,
        },
    };
    result.config_path = Some(config_path);
    result
}

/// Validate raw config text. The format is taken from `path`'s extension;
/// the file itself is not read.
#[must_use]
pub fn validate_str(raw: &str, path: &Path, known_plugins: Option<&[&str]>) -> ValidationResult {
    let mut diagnostics = Vec::new();

    // 1. Syntax
    let value = match parse_config_value(raw, path) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("syntax error: {e}"),
            ));
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    // 2. Unknown fields
    check_unknown_fields(&value, &build_schema_map(), "", &mut diagnostics);

    // 3. Types, then semantics on what parsed
    match serde_json::from_value::<StrongroomConfig>(normalize_empty(value)) {
        Ok(config) => {
            diagnostics.extend(validate_config(&config, known_plugins).diagnostics);
        },
        Err(e) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "type-error",
            "",
            format!("type error: {e}"),
        )),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

/// Semantic checks on an already parsed config.
#[must_use]
pub fn validate_config(
    config: &StrongroomConfig,
    known_plugins: Option<&[&str]>,
) -> ValidationResult {
    let mut diagnostics = Vec::new();
    let crypto = &config.crypto;

    if crypto.namespace.trim().is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "plugins",
            "crypto.namespace",
            "plugin namespace is empty",
        ));
    }

    if crypto.enabled_plugins.is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "plugins",
            "crypto.enabled_plugins",
            "no crypto plugins enabled; every encrypt and decrypt will be rejected",
        ));
    }

    let mut seen = HashSet::new();
    for (i, name) in crypto.enabled_plugins.iter().enumerate() {
        let path = format!("crypto.enabled_plugins[{i}]");
        if name.trim().is_empty() {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "plugins",
                path,
                "plugin name is empty",
            ));
            continue;
        }
        if !seen.insert(name.as_str()) {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "plugins",
                path,
                format!("plugin \"{name}\" is listed more than once"),
            ));
            continue;
        }
        let Some(known) = known_plugins else {
            continue;
        };
        if !known.contains(&name.as_str()) {
            let message = if known.is_empty() {
                format!(
                    "unknown plugin \"{name}\" (namespace \"{}\" has no registered plugins)",
                    crypto.namespace
                )
            } else {
                match suggest(name, known, 3) {
                    Some(s) => format!("unknown plugin \"{name}\" (did you mean \"{s}\"?)"),
                    None => format!("unknown plugin \"{name}\" (available: {})", known.join(", ")),
                }
            };
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "unknown-plugin",
                path,
                message,
            ));
        }
    }

    for name in crypto.plugins.keys() {
        if !seen.contains(name.as_str()) {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                "plugin-settings",
                format!("crypto.plugins.{name}"),
                "settings for a plugin that is not enabled",
            ));
        }
    }

    if seen.contains(software::NAME) {
        check_software_settings(crypto.plugins.get(software::NAME), &mut diagnostics);
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn check_software_settings(settings: Option<&serde_json::Value>, diagnostics: &mut Vec<Diagnostic>) {
    let path = format!("crypto.plugins.{}.kek", software::NAME);
    match settings.and_then(|s| s.get("kek")) {
        None => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "plugin-settings",
            path,
            "software plugin requires a base64 encoded 32-byte kek",
        )),
        Some(serde_json::Value::String(kek)) if kek.contains("${") => {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                "plugin-settings",
                path,
                format!("kek contains an unresolved placeholder: {kek}"),
            ));
        },
        Some(serde_json::Value::String(_)) => {},
        Some(_) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "plugin-settings",
            path,
            "kek must be a string",
        )),
    }
}

/// An empty TOML/YAML document parses to null, which the schema treats as
/// all defaults.
fn normalize_empty(value: serde_json::Value) -> serde_json::Value {
    if value.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        value
    }
}

/// Walk the value tree against the schema tree and flag unknown keys.
fn check_unknown_fields(
    value: &serde_json::Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let (serde_json::Value::Object(table), KnownKeys::Struct(fields)) = (value, schema) else {
        // Leaf, free-form map, or type mismatch (caught by the type check).
        return;
    };

    let known_keys: Vec<&str> = fields.keys().copied().collect();
    for (key, child_value) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        if let Some(child_schema) = fields.get(key.as_str()) {
            check_unknown_fields(child_value, child_schema, &path, diagnostics);
            continue;
        }
        let level = if prefix.is_empty() {
            "unknown field at top level"
        } else {
            "unknown field"
        };
        let message = match suggest(key, &known_keys, 3) {
            Some(s) => format!("{level} (did you mean \"{s}\"?)"),
            None => level.to_string(),
        };
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "unknown-field",
            path,
            message,
        ));
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
