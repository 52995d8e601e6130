use crate::schema::IntakeConfig;

/// Parse a TOML configuration document. An empty document yields defaults.
pub fn parse_config(raw: &str) -> anyhow::Result<IntakeConfig> {
    if raw.trim().is_empty() {
        return Ok(IntakeConfig::default());
    }
    toml::from_str(raw).map_err(|e| anyhow::anyhow!("invalid config: {e}"))
}
