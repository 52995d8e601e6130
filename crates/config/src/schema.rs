use serde::{Deserialize, Serialize};

/// Format names the PDU codec understands.
pub const KNOWN_FORMATS: &[&str] = &["3gpp", "3gpp2"];

/// Intake handler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// PDU format assumed when the envelope carries no `format` extra.
    pub default_format: String,

    /// Include message bodies in debug diagnostics. When disabled the body is
    /// logged as `<redacted>`; the published event is unaffected.
    pub log_message_bodies: bool,

    pub logging: LoggingConfig,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            default_format: "3gpp".into(),
            log_message_bodies: true,
            logging: LoggingConfig::default(),
        }
    }
}

/// Subscriber settings applied when the bridge installs logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level or `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = IntakeConfig::default();
        assert_eq!(cfg.default_format, "3gpp");
        assert!(cfg.log_message_bodies);
        assert_eq!(cfg.logging.level, "info");
        assert!(!cfg.logging.json);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: IntakeConfig = toml::from_str(
            r#"
            log_message_bodies = false

            [logging]
            json = true
            "#,
        )
        .unwrap();
        assert!(!cfg.log_message_bodies);
        assert!(cfg.logging.json);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.default_format, "3gpp");
    }

    #[test]
    fn serialize_roundtrip() {
        let cfg = IntakeConfig {
            log_message_bodies: false,
            ..Default::default()
        };
        let raw = toml::to_string(&cfg).unwrap();
        let back: IntakeConfig = toml::from_str(&raw).unwrap();
        assert_eq!(back, cfg);
    }
}
