//! Configuration validation.
//!
//! Checks a TOML document against the known schema, reports unknown or
//! misspelled fields, and flags values the intake handler would reject.

use std::collections::HashMap;

use crate::schema::{IntakeConfig, KNOWN_FORMATS};

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
    /// Category: "syntax", "unknown-field", "type-error", "value"
    pub category: &'static str,
    /// Dotted path, e.g. "logging.level"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration document.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
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
    Struct(HashMap<&'static str, KnownKeys>),
    Leaf,
}

fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Leaf, Struct};

    Struct(HashMap::from([
        ("default_format", Leaf),
        ("log_message_bodies", Leaf),
        (
            "logging",
            Struct(HashMap::from([("level", Leaf), ("json", Leaf)])),
        ),
    ]))
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

// ── Levenshtein distance ────────────────────────────────────────────────────

fn levenshtein(a: &str, b: &str) -> usize {
    let b_len = b.chars().count();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_len]
}

fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    let mut best: Option<(&'a str, usize)> = None;
    for &candidate in candidates {
        let d = levenshtein(needle, candidate);
        if d > 0 && d <= max_distance && best.as_ref().is_none_or(|(_, bd)| d < *bd) {
            best = Some((candidate, d));
        }
    }
    best.map(|(s, _)| s)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a TOML configuration document.
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    let mut diagnostics = Vec::new();

    // 1. Syntax
    let toml_value: toml::Value = match toml::from_str(toml_str) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "syntax",
                path: String::new(),
                message: format!("TOML syntax error: {e}"),
            });
            return ValidationResult { diagnostics };
        },
    };

    // 2. Unknown fields
    check_unknown_fields(&toml_value, &build_schema_map(), "", &mut diagnostics);

    // 3. Types, then values
    match toml::from_str::<IntakeConfig>(toml_str) {
        Ok(config) => check_values(&config, &mut diagnostics),
        Err(e) => diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "type-error",
            path: String::new(),
            message: format!("type error: {e}"),
        }),
    }

    ValidationResult { diagnostics }
}

fn check_unknown_fields(
    value: &toml::Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let (toml::Value::Table(table), KnownKeys::Struct(fields)) = (value, schema) else {
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
        let message = match suggest(key, &known_keys, 3) {
            Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
            None => "unknown field".to_string(),
        };
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "unknown-field",
            path,
            message,
        });
    }
}

fn check_values(config: &IntakeConfig, diagnostics: &mut Vec<Diagnostic>) {
    if !KNOWN_FORMATS.contains(&config.default_format.as_str()) {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "value",
            path: "default_format".into(),
            message: format!(
                "unknown PDU format \"{}\" (expected one of: {})",
                config.default_format,
                KNOWN_FORMATS.join(", ")
            ),
        });
    } else if config.default_format == "3gpp2" {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "value",
            path: "default_format".into(),
            message: "3gpp2 PDUs are rejected by the built-in codec".into(),
        });
    }

    let level = config.logging.level.trim();
    if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) && !level.contains('=') {
        let hint = suggest(&level.to_ascii_lowercase(), LOG_LEVELS, 2)
            .map(|s| format!(" (did you mean \"{s}\"?)"))
            .unwrap_or_default();
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "value",
            path: "logging.level".into(),
            message: format!("\"{level}\" is not a log level{hint}"),
        });
    }
}
