//! Provider configuration and credentials.
//!
//! Load order: `--config` file or `.logpolish/config.toml` → environment
//! variables → defaults. Credentials are read once from the process
//! environment into [`Credentials`] and handed to the provider factory.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported text-generation providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Claude,
    Gemini,
    Copilot,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [Self::Claude, Self::Gemini, Self::Copilot];

    /// Identifier accepted on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Gemini => "gemini",
            Self::Copilot => "copilot",
        }
    }

    /// Human-readable service name for console output.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Claude => "Claude",
            Self::Gemini => "Gemini",
            Self::Copilot => "GitHub Copilot",
        }
    }

    /// Environment variables consulted for this provider's credential, in order.
    pub fn credential_vars(self) -> &'static [&'static str] {
        match self {
            Self::Claude => &["ANTHROPIC_API_KEY"],
            Self::Gemini => &["GOOGLE_API_KEY", "GEMINI_API_KEY"],
            Self::Copilot => &["GITHUB_TOKEN"],
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown provider: '{s}'"))
    }
}

/// Top-level logpolish configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolishConfig {
    pub claude: ClaudeConfig,
    pub gemini: GeminiConfig,
    pub copilot: CopilotConfig,
}

/// Anthropic Messages API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaudeConfig {
    pub model: String,
    pub max_tokens: u32,
    pub base_url: String,
    pub timeout_secs: u64,
}

/// Google Generative Language API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

/// GitHub Copilot chat completions settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CopilotConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub base_url: String,
    pub timeout_secs: u64,
    /// Sent as `Editor-Version`; the endpoint rejects clients without one.
    pub editor_version: String,
    /// Sent as `Editor-Plugin-Version`.
    pub editor_plugin_version: String,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 300,
            base_url: "https://api.anthropic.com".to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: "gemini-pro".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for CopilotConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            max_tokens: 300,
            temperature: 0.3,
            base_url: "https://api.githubcopilot.com".to_string(),
            timeout_secs: 30,
            editor_version: "vscode/1.85.0".to_string(),
            editor_plugin_version: "copilot-chat/0.11.0".to_string(),
        }
    }
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

impl PolishConfig {
    /// Load config from `.logpolish/config.toml` under `root`, with env var overrides.
    /// Falls back to defaults if no config file exists.
    pub fn load(root: &Path) -> Result<Self> {
        let config_path = root.join(".logpolish").join("config.toml");

        let config = if config_path.exists() {
            Self::from_file(&config_path)?
        } else {
            Self::default()
        };

        config.finish()
    }

    /// Load config from an explicit path, which must exist, with env var overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::from_file(path)?.finish()
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    fn finish(mut self) -> Result<Self> {
        self.apply_env_overrides();
        self.validate()?;
        Ok(self)
    }

    fn apply_env_overrides(&mut self) {
        env_override("LOGPOLISH_CLAUDE_MODEL", &mut self.claude.model);
        env_override("LOGPOLISH_GEMINI_MODEL", &mut self.gemini.model);
        env_override("LOGPOLISH_COPILOT_MODEL", &mut self.copilot.model);
        env_override("LOGPOLISH_CLAUDE_BASE_URL", &mut self.claude.base_url);
        env_override("LOGPOLISH_GEMINI_BASE_URL", &mut self.gemini.base_url);
        env_override("LOGPOLISH_COPILOT_BASE_URL", &mut self.copilot.base_url);
        env_override(
            "LOGPOLISH_COPILOT_TEMPERATURE",
            &mut self.copilot.temperature,
        );

        let mut timeout = 0u64;
        env_override("LOGPOLISH_TIMEOUT_SECS", &mut timeout);
        if timeout > 0 {
            self.claude.timeout_secs = timeout;
            self.gemini.timeout_secs = timeout;
            self.copilot.timeout_secs = timeout;
        }
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        for (name, secs) in [
            ("claude", self.claude.timeout_secs),
            ("gemini", self.gemini.timeout_secs),
            ("copilot", self.copilot.timeout_secs),
        ] {
            if secs == 0 {
                bail!("{name}.timeout_secs must be greater than zero");
            }
        }
        if self.claude.max_tokens == 0 {
            bail!("claude.max_tokens must be greater than zero");
        }
        if self.copilot.max_tokens == 0 {
            bail!("copilot.max_tokens must be greater than zero");
        }
        if !(0.0..=2.0).contains(&self.copilot.temperature) {
            bail!(
                "copilot.temperature ({}) must be between 0 and 2",
                self.copilot.temperature
            );
        }
        Ok(())
    }

    /// Replace the model for one provider.
    pub fn set_model(&mut self, kind: ProviderKind, model: String) {
        match kind {
            ProviderKind::Claude => self.claude.model = model,
            ProviderKind::Gemini => self.gemini.model = model,
            ProviderKind::Copilot => self.copilot.model = model,
        }
    }

    /// The configured model for one provider.
    pub fn model(&self, kind: ProviderKind) -> &str {
        match kind {
            ProviderKind::Claude => &self.claude.model,
            ProviderKind::Gemini => &self.gemini.model,
            ProviderKind::Copilot => &self.copilot.model,
        }
    }
}

/// Provider credentials, captured once at startup.
#[derive(Clone, Default)]
pub struct Credentials {
    pub anthropic_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub github_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("anthropic_api_key", &mask(&self.anthropic_api_key))
            .field("google_api_key", &mask(&self.google_api_key))
            .field("github_token", &mask(&self.github_token))
            .finish()
    }
}

impl Credentials {
    /// Read credentials from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read credentials through an arbitrary lookup. Empty values count as unset,
    /// and for providers with several variable names the first set one wins.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let first_set = |kind: ProviderKind| {
            kind.credential_vars()
                .iter()
                .find_map(|var| lookup(*var).filter(|v| !v.is_empty()))
        };

        Self {
            anthropic_api_key: first_set(ProviderKind::Claude),
            google_api_key: first_set(ProviderKind::Gemini),
            github_token: first_set(ProviderKind::Copilot),
        }
    }

    /// The credential for a provider, if one was found.
    pub fn get(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::Claude => self.anthropic_api_key.as_deref(),
            ProviderKind::Gemini => self.google_api_key.as_deref(),
            ProviderKind::Copilot => self.github_token.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = PolishConfig::default();
        assert_eq!(config.claude.model, "claude-sonnet-4-20250514");
        assert_eq!(config.claude.max_tokens, 300);
        assert_eq!(config.gemini.model, "gemini-pro");
        assert_eq!(config.copilot.model, "gpt-4");
        assert_eq!(config.copilot.temperature, 0.3);
        assert_eq!(config.copilot.timeout_secs, 30);
        assert_eq!(config.copilot.editor_version, "vscode/1.85.0");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
[claude]
model = "claude-haiku-4-5"

[copilot]
temperature = 0.7
timeout_secs = 10
"#;
        let config: PolishConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.claude.model, "claude-haiku-4-5");
        assert_eq!(config.copilot.temperature, 0.7);
        assert_eq!(config.copilot.timeout_secs, 10);
        // Defaults for unspecified fields
        assert_eq!(config.claude.max_tokens, 300);
        assert_eq!(config.copilot.model, "gpt-4");
        assert_eq!(config.gemini.timeout_secs, 120);
    }

    #[test]
    fn test_config_load_nonexistent() {
        let config = PolishConfig::load(Path::new("/nonexistent/path")).unwrap();
        assert_eq!(config.copilot.max_tokens, 300);
    }

    #[test]
    fn test_load_reads_project_config() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join(".logpolish");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.toml"), "[gemini]\nmodel = \"gemini-2.0-flash\"\n")
            .unwrap();

        let config = PolishConfig::load(tmp.path()).unwrap();
        assert_eq!(config.gemini.model, "gemini-2.0-flash");
    }

    #[test]
    fn test_load_from_missing_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(PolishConfig::load_from(&tmp.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_invalid_temperature_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[copilot]\ntemperature = 3.5\n").unwrap();

        let err = PolishConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = PolishConfig::default();
        config.gemini.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_set_model() {
        let mut config = PolishConfig::default();
        config.set_model(ProviderKind::Copilot, "gpt-4o".to_string());
        assert_eq!(config.model(ProviderKind::Copilot), "gpt-4o");
        assert_eq!(config.model(ProviderKind::Claude), "claude-sonnet-4-20250514");
    }

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!("claude".parse::<ProviderKind>(), Ok(ProviderKind::Claude));
        assert_eq!("gemini".parse::<ProviderKind>(), Ok(ProviderKind::Gemini));
        assert_eq!("copilot".parse::<ProviderKind>(), Ok(ProviderKind::Copilot));
        assert!("openai".parse::<ProviderKind>().is_err());
        assert!("Claude".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_credentials_from_lookup() {
        let creds = Credentials::from_lookup(lookup_from(&[
            ("ANTHROPIC_API_KEY", "sk-ant"),
            ("GITHUB_TOKEN", "ghp_x"),
        ]));
        assert_eq!(creds.get(ProviderKind::Claude), Some("sk-ant"));
        assert_eq!(creds.get(ProviderKind::Copilot), Some("ghp_x"));
        assert_eq!(creds.get(ProviderKind::Gemini), None);
    }

    #[test]
    fn test_gemini_primary_name_wins() {
        let creds = Credentials::from_lookup(lookup_from(&[
            ("GOOGLE_API_KEY", "google"),
            ("GEMINI_API_KEY", "gemini"),
        ]));
        assert_eq!(creds.get(ProviderKind::Gemini), Some("google"));
    }

    #[test]
    fn test_gemini_alternate_name_fallback() {
        let creds = Credentials::from_lookup(lookup_from(&[
            ("GOOGLE_API_KEY", ""),
            ("GEMINI_API_KEY", "gemini"),
        ]));
        assert_eq!(creds.get(ProviderKind::Gemini), Some("gemini"));
    }

    #[test]
    fn test_empty_credential_is_unset() {
        let creds = Credentials::from_lookup(lookup_from(&[("ANTHROPIC_API_KEY", "")]));
        assert_eq!(creds.get(ProviderKind::Claude), None);
    }

    #[test]
    fn test_credentials_debug_masks_values() {
        let creds = Credentials::from_lookup(lookup_from(&[("GITHUB_TOKEN", "ghp_secret")]));
        let debug = format!("{creds:?}");
        assert!(!debug.contains("ghp_secret"));
        assert!(debug.contains("<set>"));
    }
}
