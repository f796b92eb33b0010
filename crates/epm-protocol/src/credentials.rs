//! Per-provider credential sets.
//!
//! [`Credentials`] is a sum type with one variant per provider, each carrying
//! only that provider's fields. A profile therefore cannot hold live values
//! for any provider other than its own. Keys and secrets are held as
//! [`SecretValue`]s.

use schemars::JsonSchema;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::models::{Provider, SafetyThreshold};
use crate::schema::Field;
use crate::secret::SecretValue;

/// OpenAI fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OpenAiCredentials {
    /// API key
    #[serde(rename = "openaiApiKey", default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretValue>,
    /// Endpoint URL
    #[serde(rename = "openaiUrl", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Azure OpenAI fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AzureCredentials {
    /// API key
    #[serde(rename = "azureApiKey", default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretValue>,
    /// API version, e.g. `2024-02-01`
    #[serde(rename = "azureApiVersion", default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    /// Deployment endpoint URL
    #[serde(rename = "azureUrl", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Google Gemini fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GoogleCredentials {
    /// API key
    #[serde(rename = "googleApiKey", default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretValue>,
    /// API version
    #[serde(rename = "googleApiVersion", default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    /// Endpoint URL
    #[serde(rename = "googleUrl", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Safety filter threshold
    #[serde(
        rename = "googleSafetySettings",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub safety_settings: Option<SafetyThreshold>,
}

/// Anthropic fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AnthropicCredentials {
    /// API key
    #[serde(rename = "anthropicApiKey", default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretValue>,
    /// API version header value
    #[serde(
        rename = "anthropicApiVersion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub api_version: Option<String>,
    /// Endpoint URL
    #[serde(rename = "anthropicUrl", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Baidu fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BaiduCredentials {
    /// API key
    #[serde(rename = "baiduApiKey", default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretValue>,
    /// Secret key
    #[serde(rename = "baiduSecretKey", default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<SecretValue>,
    /// Endpoint URL
    #[serde(rename = "baiduUrl", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// ByteDance fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ByteDanceCredentials {
    /// API key
    #[serde(rename = "bytedanceApiKey", default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretValue>,
    /// Endpoint URL
    #[serde(rename = "bytedanceUrl", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Alibaba fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AlibabaCredentials {
    /// API key
    #[serde(rename = "alibabaApiKey", default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretValue>,
    /// Endpoint URL
    #[serde(rename = "alibabaUrl", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Tencent fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TencentCredentials {
    /// Secret id
    #[serde(rename = "tencentSecretId", default, skip_serializing_if = "Option::is_none")]
    pub secret_id: Option<SecretValue>,
    /// Secret key
    #[serde(rename = "tencentSecretKey", default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<SecretValue>,
    /// Endpoint URL
    #[serde(rename = "tencentUrl", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Moonshot fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MoonshotCredentials {
    /// API key
    #[serde(rename = "moonshotApiKey", default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretValue>,
    /// Endpoint URL
    #[serde(rename = "moonshotUrl", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// XAI fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct XaiCredentials {
    /// API key
    #[serde(rename = "xaiApiKey", default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretValue>,
    /// Endpoint URL
    #[serde(rename = "xaiUrl", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// ChatGLM fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChatGlmCredentials {
    /// API key
    #[serde(rename = "chatglmApiKey", default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretValue>,
    /// Endpoint URL
    #[serde(rename = "chatglmUrl", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Stability fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StabilityCredentials {
    /// API key
    #[serde(rename = "stabilityApiKey", default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretValue>,
    /// Endpoint URL
    #[serde(rename = "stabilityUrl", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// iFlytek fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IflytekCredentials {
    /// API key
    #[serde(rename = "iflytekApiKey", default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretValue>,
    /// API secret
    #[serde(rename = "iflytekApiSecret", default, skip_serializing_if = "Option::is_none")]
    pub api_secret: Option<SecretValue>,
    /// Endpoint URL
    #[serde(rename = "iflytekUrl", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Provider-specific fields, discriminated by the `provider` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "provider")]
#[allow(missing_docs)]
pub enum Credentials {
    OpenAI(OpenAiCredentials),
    Azure(AzureCredentials),
    Google(GoogleCredentials),
    Anthropic(AnthropicCredentials),
    Baidu(BaiduCredentials),
    ByteDance(ByteDanceCredentials),
    Alibaba(AlibabaCredentials),
    Tencent(TencentCredentials),
    Moonshot(MoonshotCredentials),
    XAI(XaiCredentials),
    ChatGLM(ChatGlmCredentials),
    Stability(StabilityCredentials),
    Iflytek(IflytekCredentials),
}

impl Default for Credentials {
    fn default() -> Self {
        Self::empty(Provider::default())
    }
}

impl Credentials {
    /// A credential set for `provider` with every field absent.
    pub fn empty(provider: Provider) -> Self {
        match provider {
            Provider::OpenAI => Self::OpenAI(Default::default()),
            Provider::Azure => Self::Azure(Default::default()),
            Provider::Google => Self::Google(Default::default()),
            Provider::Anthropic => Self::Anthropic(Default::default()),
            Provider::Baidu => Self::Baidu(Default::default()),
            Provider::ByteDance => Self::ByteDance(Default::default()),
            Provider::Alibaba => Self::Alibaba(Default::default()),
            Provider::Tencent => Self::Tencent(Default::default()),
            Provider::Moonshot => Self::Moonshot(Default::default()),
            Provider::XAI => Self::XAI(Default::default()),
            Provider::ChatGLM => Self::ChatGLM(Default::default()),
            Provider::Stability => Self::Stability(Default::default()),
            Provider::Iflytek => Self::Iflytek(Default::default()),
        }
    }

    /// The provider tag of this variant.
    pub fn provider(&self) -> Provider {
        match self {
            Self::OpenAI(_) => Provider::OpenAI,
            Self::Azure(_) => Provider::Azure,
            Self::Google(_) => Provider::Google,
            Self::Anthropic(_) => Provider::Anthropic,
            Self::Baidu(_) => Provider::Baidu,
            Self::ByteDance(_) => Provider::ByteDance,
            Self::Alibaba(_) => Provider::Alibaba,
            Self::Tencent(_) => Provider::Tencent,
            Self::Moonshot(_) => Provider::Moonshot,
            Self::XAI(_) => Provider::XAI,
            Self::ChatGLM(_) => Provider::ChatGLM,
            Self::Stability(_) => Provider::Stability,
            Self::Iflytek(_) => Provider::Iflytek,
        }
    }

    /// Read a field. `None` when the field is absent or belongs to another
    /// provider.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.slot(field).and_then(|slot| slot.read())
    }

    /// Write a field. Returns `false`, leaving `self` untouched, when the
    /// field belongs to another provider.
    pub fn set(&mut self, field: Field, value: impl Into<String>) -> bool {
        match self.slot_mut(field) {
            Some(slot) => {
                slot.write(Some(value.into()));
                true
            }
            None => false,
        }
    }

    /// Make a field absent.
    pub fn unset(&mut self, field: Field) {
        if let Some(slot) = self.slot_mut(field) {
            slot.write(None);
        }
    }

    /// The safety threshold, for Google credentials that carry one.
    pub fn safety_settings(&self) -> Option<SafetyThreshold> {
        match self {
            Self::Google(c) => c.safety_settings,
            _ => None,
        }
    }

    /// Set the safety threshold. Ignored for providers other than Google.
    pub fn set_safety_settings(&mut self, threshold: SafetyThreshold) -> bool {
        match self {
            Self::Google(c) => {
                c.safety_settings = Some(threshold);
                true
            }
            _ => false,
        }
    }

    /// Present fields, in schema order.
    pub fn present_fields(&self) -> impl Iterator<Item = (Field, &str)> {
        self.provider()
            .fields()
            .iter()
            .filter_map(move |&f| self.get(f).map(|v| (f, v)))
    }
}

/// A text or secret struct member.
trait Slot {
    fn read(&self) -> Option<&str>;
    fn write(&mut self, value: Option<String>);
    fn is_secret(&self) -> bool;
}

impl Slot for Option<String> {
    fn read(&self) -> Option<&str> {
        self.as_deref()
    }

    fn write(&mut self, value: Option<String>) {
        *self = value;
    }

    fn is_secret(&self) -> bool {
        false
    }
}

impl Slot for Option<SecretValue> {
    fn read(&self) -> Option<&str> {
        self.as_ref().map(|secret| secret.expose_secret())
    }

    fn write(&mut self, value: Option<String>) {
        *self = value.map(SecretValue::new);
    }

    fn is_secret(&self) -> bool {
        true
    }
}

// Maps (variant, field) pairs onto struct members for both accessors.
macro_rules! credential_slots {
    ($($variant:ident . $member:ident => $field:ident),* $(,)?) => {
        impl Credentials {
            fn slot(&self, field: Field) -> Option<&dyn Slot> {
                match (self, field) {
                    $((Self::$variant(c), Field::$field) => Some(&c.$member as &dyn Slot),)*
                    _ => None,
                }
            }

            fn slot_mut(&mut self, field: Field) -> Option<&mut dyn Slot> {
                match (self, field) {
                    $((Self::$variant(c), Field::$field) => Some(&mut c.$member as &mut dyn Slot),)*
                    _ => None,
                }
            }
        }
    };
}

credential_slots! {
    OpenAI.api_key => OpenaiApiKey,
    OpenAI.url => OpenaiUrl,
    Azure.api_key => AzureApiKey,
    Azure.api_version => AzureApiVersion,
    Azure.url => AzureUrl,
    Google.api_key => GoogleApiKey,
    Google.api_version => GoogleApiVersion,
    Google.url => GoogleUrl,
    Anthropic.api_key => AnthropicApiKey,
    Anthropic.api_version => AnthropicApiVersion,
    Anthropic.url => AnthropicUrl,
    Baidu.api_key => BaiduApiKey,
    Baidu.secret_key => BaiduSecretKey,
    Baidu.url => BaiduUrl,
    ByteDance.api_key => BytedanceApiKey,
    ByteDance.url => BytedanceUrl,
    Alibaba.api_key => AlibabaApiKey,
    Alibaba.url => AlibabaUrl,
    Tencent.secret_id => TencentSecretId,
    Tencent.secret_key => TencentSecretKey,
    Tencent.url => TencentUrl,
    Moonshot.api_key => MoonshotApiKey,
    Moonshot.url => MoonshotUrl,
    XAI.api_key => XaiApiKey,
    XAI.url => XaiUrl,
    ChatGLM.api_key => ChatglmApiKey,
    ChatGLM.url => ChatglmUrl,
    Stability.api_key => StabilityApiKey,
    Stability.url => StabilityUrl,
    Iflytek.api_key => IflytekApiKey,
    Iflytek.api_secret => IflytekApiSecret,
    Iflytek.url => IflytekUrl,
}
