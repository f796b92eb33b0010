//! Static provider field schema.
//!
//! Every text credential field belongs to exactly one provider. Google
//! additionally owns the [`SafetyThreshold`](crate::SafetyThreshold) setting,
//! which is typed and handled outside the text field table.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::{ParseError, Provider};

/// Stored key of the Google safety threshold.
pub const SAFETY_SETTINGS_KEY: &str = "googleSafetySettings";

/// A named text credential field. Serializes as its stored key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub enum Field {
    OpenaiApiKey,
    OpenaiUrl,
    AzureApiKey,
    AzureApiVersion,
    AzureUrl,
    GoogleApiKey,
    GoogleApiVersion,
    GoogleUrl,
    AnthropicApiKey,
    AnthropicApiVersion,
    AnthropicUrl,
    BaiduApiKey,
    BaiduSecretKey,
    BaiduUrl,
    BytedanceApiKey,
    BytedanceUrl,
    AlibabaApiKey,
    AlibabaUrl,
    TencentSecretId,
    TencentSecretKey,
    TencentUrl,
    MoonshotApiKey,
    MoonshotUrl,
    XaiApiKey,
    XaiUrl,
    ChatglmApiKey,
    ChatglmUrl,
    StabilityApiKey,
    StabilityUrl,
    IflytekApiKey,
    IflytekApiSecret,
    IflytekUrl,
}

const OPENAI: &[Field] = &[Field::OpenaiApiKey, Field::OpenaiUrl];
const AZURE: &[Field] = &[Field::AzureApiKey, Field::AzureApiVersion, Field::AzureUrl];
const GOOGLE: &[Field] = &[Field::GoogleApiKey, Field::GoogleApiVersion, Field::GoogleUrl];
const ANTHROPIC: &[Field] = &[
    Field::AnthropicApiKey,
    Field::AnthropicApiVersion,
    Field::AnthropicUrl,
];
const BAIDU: &[Field] = &[Field::BaiduApiKey, Field::BaiduSecretKey, Field::BaiduUrl];
const BYTEDANCE: &[Field] = &[Field::BytedanceApiKey, Field::BytedanceUrl];
const ALIBABA: &[Field] = &[Field::AlibabaApiKey, Field::AlibabaUrl];
const TENCENT: &[Field] = &[
    Field::TencentSecretId,
    Field::TencentSecretKey,
    Field::TencentUrl,
];
const MOONSHOT: &[Field] = &[Field::MoonshotApiKey, Field::MoonshotUrl];
const XAI: &[Field] = &[Field::XaiApiKey, Field::XaiUrl];
const CHATGLM: &[Field] = &[Field::ChatglmApiKey, Field::ChatglmUrl];
const STABILITY: &[Field] = &[Field::StabilityApiKey, Field::StabilityUrl];
const IFLYTEK: &[Field] = &[
    Field::IflytekApiKey,
    Field::IflytekApiSecret,
    Field::IflytekUrl,
];

/// Text fields owned by `provider`, in display order.
pub fn fields_of(provider: Provider) -> &'static [Field] {
    match provider {
        Provider::OpenAI => OPENAI,
        Provider::Azure => AZURE,
        Provider::Google => GOOGLE,
        Provider::Anthropic => ANTHROPIC,
        Provider::Baidu => BAIDU,
        Provider::ByteDance => BYTEDANCE,
        Provider::Alibaba => ALIBABA,
        Provider::Tencent => TENCENT,
        Provider::Moonshot => MOONSHOT,
        Provider::XAI => XAI,
        Provider::ChatGLM => CHATGLM,
        Provider::Stability => STABILITY,
        Provider::Iflytek => IFLYTEK,
    }
}

impl Provider {
    /// Text fields owned by this provider. See [`fields_of`].
    pub fn fields(self) -> &'static [Field] {
        fields_of(self)
    }

    /// Whether this provider owns the safety threshold setting.
    pub fn has_safety_settings(self) -> bool {
        self == Provider::Google
    }
}

impl Field {
    /// Every field of every provider.
    pub fn all() -> impl Iterator<Item = Field> {
        Provider::ALL.into_iter().flat_map(fields_of).copied()
    }

    /// The provider owning this field.
    pub fn provider(self) -> Provider {
        use Field::*;
        match self {
            OpenaiApiKey | OpenaiUrl => Provider::OpenAI,
            AzureApiKey | AzureApiVersion | AzureUrl => Provider::Azure,
            GoogleApiKey | GoogleApiVersion | GoogleUrl => Provider::Google,
            AnthropicApiKey | AnthropicApiVersion | AnthropicUrl => Provider::Anthropic,
            BaiduApiKey | BaiduSecretKey | BaiduUrl => Provider::Baidu,
            BytedanceApiKey | BytedanceUrl => Provider::ByteDance,
            AlibabaApiKey | AlibabaUrl => Provider::Alibaba,
            TencentSecretId | TencentSecretKey | TencentUrl => Provider::Tencent,
            MoonshotApiKey | MoonshotUrl => Provider::Moonshot,
            XaiApiKey | XaiUrl => Provider::XAI,
            ChatglmApiKey | ChatglmUrl => Provider::ChatGLM,
            StabilityApiKey | StabilityUrl => Provider::Stability,
            IflytekApiKey | IflytekApiSecret | IflytekUrl => Provider::Iflytek,
        }
    }

    /// The stored key, e.g. `azureApiVersion`.
    pub fn key(self) -> &'static str {
        use Field::*;
        match self {
            OpenaiApiKey => "openaiApiKey",
            OpenaiUrl => "openaiUrl",
            AzureApiKey => "azureApiKey",
            AzureApiVersion => "azureApiVersion",
            AzureUrl => "azureUrl",
            GoogleApiKey => "googleApiKey",
            GoogleApiVersion => "googleApiVersion",
            GoogleUrl => "googleUrl",
            AnthropicApiKey => "anthropicApiKey",
            AnthropicApiVersion => "anthropicApiVersion",
            AnthropicUrl => "anthropicUrl",
            BaiduApiKey => "baiduApiKey",
            BaiduSecretKey => "baiduSecretKey",
            BaiduUrl => "baiduUrl",
            BytedanceApiKey => "bytedanceApiKey",
            BytedanceUrl => "bytedanceUrl",
            AlibabaApiKey => "alibabaApiKey",
            AlibabaUrl => "alibabaUrl",
            TencentSecretId => "tencentSecretId",
            TencentSecretKey => "tencentSecretKey",
            TencentUrl => "tencentUrl",
            MoonshotApiKey => "moonshotApiKey",
            MoonshotUrl => "moonshotUrl",
            XaiApiKey => "xaiApiKey",
            XaiUrl => "xaiUrl",
            ChatglmApiKey => "chatglmApiKey",
            ChatglmUrl => "chatglmUrl",
            StabilityApiKey => "stabilityApiKey",
            StabilityUrl => "stabilityUrl",
            IflytekApiKey => "iflytekApiKey",
            IflytekApiSecret => "iflytekApiSecret",
            IflytekUrl => "iflytekUrl",
        }
    }

    /// Whether the value is a secret that should be masked on display.
    pub fn is_secret(self) -> bool {
        let key = self.key();
        key.ends_with("ApiKey")
            || key.ends_with("SecretKey")
            || key.ends_with("SecretId")
            || key.ends_with("ApiSecret")
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Field {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::all()
            .find(|f| f.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::new("field", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_field_is_listed_under_its_owner() {
        for provider in Provider::ALL {
            for field in fields_of(provider) {
                assert_eq!(field.provider(), provider, "{field} listed under {provider}");
            }
        }
    }

    #[test]
    fn fields_are_not_shared() {
        let all: Vec<Field> = Field::all().collect();
        let unique: HashSet<Field> = all.iter().copied().collect();
        assert_eq!(all.len(), unique.len());
        assert_eq!(all.len(), 32);
    }

    #[test]
    fn serde_key_matches_key() -> anyhow::Result<()> {
        for field in Field::all() {
            assert_eq!(serde_json::to_string(&field)?, format!("\"{}\"", field.key()));
        }
        Ok(())
    }

    #[test]
    fn azure_schema() {
        assert_eq!(
            fields_of(Provider::Azure),
            &[Field::AzureApiKey, Field::AzureApiVersion, Field::AzureUrl]
        );
        assert!(Provider::Google.has_safety_settings());
        assert!(!Provider::Azure.has_safety_settings());
    }

    #[test]
    fn secrets_are_flagged() {
        assert!(Field::TencentSecretId.is_secret());
        assert!(Field::IflytekApiSecret.is_secret());
        assert!(!Field::AzureApiVersion.is_secret());
        assert!(!Field::OpenaiUrl.is_secret());
    }

    #[test]
    fn parse_field_key() {
        assert_eq!("baiduSecretKey".parse::<Field>(), Ok(Field::BaiduSecretKey));
        assert!("deepseekApiKey".parse::<Field>().is_err());
    }
}
