use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form finding details. Renderers must not assume any key is present.
pub type Details = Map<String, Value>;

/// Kinds of suspicious activity a rule can report.
///
/// Tags that are not known here are kept verbatim in `Other` so that findings
/// produced by newer rules still score and render.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FindingType {
    LargeTransfer,
    InteractsWithKnownScamAddress,
    UsesMixerService,
    PotentialRugPullToken,
    HoneypotContract,
    DrainedWalletActivity,
    UnusualTransactionPattern,
    NewlyDeployedHighVolumeToken,
    Other(String),
}

impl FindingType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::LargeTransfer => "large_transfer",
            Self::InteractsWithKnownScamAddress => "interacts_with_known_scam_address",
            Self::UsesMixerService => "uses_mixer_service",
            Self::PotentialRugPullToken => "potential_rug_pull_token",
            Self::HoneypotContract => "honeypot_contract",
            Self::DrainedWalletActivity => "drained_wallet_activity",
            Self::UnusualTransactionPattern => "unusual_transaction_pattern",
            Self::NewlyDeployedHighVolumeToken => "newly_deployed_high_volume_token",
            Self::Other(tag) => tag,
        }
    }
}

impl From<&str> for FindingType {
    fn from(tag: &str) -> Self {
        match tag {
            "large_transfer" => Self::LargeTransfer,
            "interacts_with_known_scam_address" => Self::InteractsWithKnownScamAddress,
            "uses_mixer_service" => Self::UsesMixerService,
            "potential_rug_pull_token" => Self::PotentialRugPullToken,
            "honeypot_contract" => Self::HoneypotContract,
            "drained_wallet_activity" => Self::DrainedWalletActivity,
            "unusual_transaction_pattern" => Self::UnusualTransactionPattern,
            "newly_deployed_high_volume_token" => Self::NewlyDeployedHighVolumeToken,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for FindingType {
    fn from(tag: String) -> Self {
        Self::from(tag.as_str())
    }
}

impl From<FindingType> for String {
    fn from(finding_type: FindingType) -> Self {
        finding_type.as_str().to_string()
    }
}

/// One detected suspicious activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub finding_type: FindingType,
    pub message: String,
    #[serde(default)]
    pub details: Details,
}

impl Finding {
    pub fn new(finding_type: FindingType, message: impl Into<String>, details: Details) -> Self {
        Self {
            finding_type,
            message: message.into(),
            details,
        }
    }
}
