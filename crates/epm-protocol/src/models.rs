use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::credentials::Credentials;
use crate::schema::Field;
use crate::secret::SecretValue;
use secrecy::ExposeSecret;

/// Supported LLM service providers.
///
/// Serialized with the exact variant name (`"OpenAI"`, `"ByteDance"`, ...),
/// which is also the `provider` tag of a stored profile.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
)]
pub enum Provider {
    /// OpenAI API (api.openai.com)
    #[default]
    OpenAI,
    /// Azure OpenAI deployments
    Azure,
    /// Google Gemini
    Google,
    /// Anthropic Claude
    Anthropic,
    /// Baidu ERNIE
    Baidu,
    /// ByteDance Doubao
    ByteDance,
    /// Alibaba Qwen
    Alibaba,
    /// Tencent Hunyuan
    Tencent,
    /// Moonshot Kimi
    Moonshot,
    /// XAI (Grok)
    XAI,
    /// Zhipu ChatGLM
    ChatGLM,
    /// Stability AI
    Stability,
    /// iFlytek Spark
    Iflytek,
}

impl Provider {
    /// Every supported provider, in selector order.
    pub const ALL: [Provider; 13] = [
        Provider::OpenAI,
        Provider::Azure,
        Provider::Google,
        Provider::Anthropic,
        Provider::Baidu,
        Provider::ByteDance,
        Provider::Alibaba,
        Provider::Tencent,
        Provider::Moonshot,
        Provider::XAI,
        Provider::ChatGLM,
        Provider::Stability,
        Provider::Iflytek,
    ];

    /// The tag string used in stored profiles.
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::OpenAI => "OpenAI",
            Provider::Azure => "Azure",
            Provider::Google => "Google",
            Provider::Anthropic => "Anthropic",
            Provider::Baidu => "Baidu",
            Provider::ByteDance => "ByteDance",
            Provider::Alibaba => "Alibaba",
            Provider::Tencent => "Tencent",
            Provider::Moonshot => "Moonshot",
            Provider::XAI => "XAI",
            Provider::ChatGLM => "ChatGLM",
            Provider::Stability => "Stability",
            Provider::Iflytek => "Iflytek",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ParseError;

    /// Case-insensitive match against the tag string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::new("provider", s))
    }
}

/// Google safety filter threshold. Only meaningful for [`Provider::Google`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyThreshold {
    /// Never block content
    #[default]
    BlockNone,
    /// Block only high-probability unsafe content
    BlockOnlyHigh,
    /// Block medium and high
    BlockMediumAndAbove,
    /// Block low, medium and high
    BlockLowAndAbove,
}

impl SafetyThreshold {
    /// Every threshold, least to most restrictive.
    pub const ALL: [SafetyThreshold; 4] = [
        SafetyThreshold::BlockNone,
        SafetyThreshold::BlockOnlyHigh,
        SafetyThreshold::BlockMediumAndAbove,
        SafetyThreshold::BlockLowAndAbove,
    ];

    /// The stored string form, e.g. `BLOCK_NONE`.
    pub fn as_str(self) -> &'static str {
        match self {
            SafetyThreshold::BlockNone => "BLOCK_NONE",
            SafetyThreshold::BlockOnlyHigh => "BLOCK_ONLY_HIGH",
            SafetyThreshold::BlockMediumAndAbove => "BLOCK_MEDIUM_AND_ABOVE",
            SafetyThreshold::BlockLowAndAbove => "BLOCK_LOW_AND_ABOVE",
        }
    }
}

impl fmt::Display for SafetyThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SafetyThreshold {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SafetyThreshold::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::new("safety threshold", s))
    }
}

/// Failure to parse a provider, field or threshold name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    kind: &'static str,
    input: String,
}

impl ParseError {
    pub(crate) fn new(kind: &'static str, input: &str) -> Self {
        Self {
            kind,
            input: input.to_string(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: {:?}", self.kind, self.input)
    }
}

impl std::error::Error for ParseError {}

/// A named, persisted snapshot of one provider's connection settings.
///
/// Stored as a flat JSON object:
/// `{"id":"..","name":"work","customModels":"","provider":"OpenAI","openaiApiKey":"sk-1"}`.
/// Keys belonging to other providers are dropped when a stored profile is
/// decoded, so they can never be read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Profile {
    /// Opaque id, assigned once at creation
    pub id: String,
    /// User-facing label (not unique)
    pub name: String,
    /// Custom model list shared across providers
    #[serde(
        rename = "customModels",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub custom_models: Option<String>,
    /// Provider tag plus that provider's fields
    #[serde(flatten)]
    pub credentials: Credentials,
}

impl Profile {
    /// Create a profile with no custom models.
    pub fn new(id: impl Into<String>, name: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            custom_models: None,
            credentials,
        }
    }

    /// Set the custom model list
    pub fn with_custom_models(mut self, models: impl Into<String>) -> Self {
        self.custom_models = Some(models.into());
        self
    }

    /// The provider this profile belongs to.
    pub fn provider(&self) -> Provider {
        self.credentials.provider()
    }

    /// Selector label, e.g. `work (OpenAI)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.provider())
    }
}

/// The live credential record the rest of the application reads.
///
/// Text fields are kept sparse: a field that is absent from `values` reads as
/// the empty string, and writing an empty string removes it. Equality is
/// therefore independent of how a field came to be empty. Every value is a
/// [`SecretValue`], so `Debug` output never shows one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessConfig {
    /// Currently selected provider
    #[serde(default)]
    pub provider: Provider,
    #[serde(default)]
    values: BTreeMap<Field, SecretValue>,
    /// Google safety threshold
    #[serde(default)]
    pub google_safety_settings: SafetyThreshold,
}

impl AccessConfig {
    /// Read a field; unset fields read as `""`.
    pub fn get(&self, field: Field) -> &str {
        self.values
            .get(&field)
            .map(|v| v.expose_secret())
            .unwrap_or_default()
    }

    /// The held value of a field, `None` when unset.
    pub fn secret(&self, field: Field) -> Option<&SecretValue> {
        self.values.get(&field)
    }

    /// Write a field. An empty value resets it.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            self.values.remove(&field);
        } else {
            self.values.insert(field, SecretValue::new(value));
        }
    }

    /// Reset every field of every provider, and the safety threshold, to
    /// their defaults. The provider tag is left as is.
    pub fn reset_credentials(&mut self) {
        self.values.clear();
        self.google_safety_settings = SafetyThreshold::default();
    }

    /// Fields currently holding a non-empty value.
    pub fn populated_fields(&self) -> impl Iterator<Item = (Field, &str)> {
        self.values.iter().map(|(f, v)| (*f, v.expose_secret()))
    }

    /// True when nothing outside the selected provider holds a non-default
    /// value.
    pub fn is_isolated(&self) -> bool {
        let fields_ok = self
            .populated_fields()
            .all(|(field, _)| field.provider() == self.provider);
        let safety_ok = self.provider == Provider::Google
            || self.google_safety_settings == SafetyThreshold::default();
        fields_ok && safety_ok
    }
}

/// Application-level settings touched by profile switching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Comma separated custom model names
    #[serde(default)]
    pub custom_models: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn provider_parse_is_case_insensitive() {
        assert_eq!("azure".parse::<Provider>(), Ok(Provider::Azure));
        assert_eq!("ChatGLM".parse::<Provider>(), Ok(Provider::ChatGLM));
        assert!("DeepSeek".parse::<Provider>().is_err());
    }

    #[test]
    fn provider_serializes_as_tag() -> anyhow::Result<()> {
        assert_eq!(serde_json::to_string(&Provider::ByteDance)?, "\"ByteDance\"");
        assert_eq!(serde_json::to_string(&Provider::XAI)?, "\"XAI\"");
        Ok(())
    }

    #[test]
    fn safety_threshold_wire_names() -> anyhow::Result<()> {
        assert_eq!(
            serde_json::to_string(&SafetyThreshold::BlockMediumAndAbove)?,
            "\"BLOCK_MEDIUM_AND_ABOVE\""
        );
        assert_eq!(
            "block_only_high".parse::<SafetyThreshold>(),
            Ok(SafetyThreshold::BlockOnlyHigh)
        );
        Ok(())
    }

    #[test]
    fn access_config_empty_write_resets() {
        let mut access = AccessConfig::default();
        access.set(Field::OpenaiApiKey, "sk-1");
        assert_eq!(access.get(Field::OpenaiApiKey), "sk-1");

        access.set(Field::OpenaiApiKey, "");
        assert_eq!(access, AccessConfig::default());
    }

    #[test]
    fn access_config_isolation_check() {
        let mut access = AccessConfig::default();
        access.set(Field::OpenaiUrl, "https://api.openai.com");
        assert!(access.is_isolated());

        access.set(Field::AzureApiKey, "az-1");
        assert!(!access.is_isolated());

        access.reset_credentials();
        access.google_safety_settings = SafetyThreshold::BlockOnlyHigh;
        assert!(!access.is_isolated());

        access.provider = Provider::Google;
        assert!(access.is_isolated());
    }

    #[test]
    fn access_config_debug_hides_values() {
        let mut access = AccessConfig::default();
        access.set(Field::OpenaiApiKey, "sk-live-9");
        let shown = format!("{access:?}");
        assert!(!shown.contains("sk-live-9"), "{shown}");
        assert!(shown.contains("openaiApiKey") || shown.contains("OpenaiApiKey"));
    }

    #[test]
    fn populated_fields_skips_cleared_entries() {
        let mut access = AccessConfig::default();
        access.set(Field::AzureApiKey, "az");
        access.set(Field::AzureUrl, "https://az.example");
        access.set(Field::AzureUrl, "");
        let populated: Vec<_> = access.populated_fields().collect();
        assert_eq!(populated, vec![(Field::AzureApiKey, "az")]);
    }

    #[test]
    fn profile_debug_hides_keys() {
        let mut credentials = Credentials::empty(Provider::Anthropic);
        credentials.set(Field::AnthropicApiKey, "ant-secret");
        let profile = Profile::new("1", "claude", credentials);
        assert!(!format!("{profile:?}").contains("ant-secret"));
    }

    #[test]
    fn profile_label() {
        let profile = Profile::new("1", "work", Credentials::empty(Provider::Moonshot));
        assert_eq!(profile.label(), "work (Moonshot)");
    }
}
