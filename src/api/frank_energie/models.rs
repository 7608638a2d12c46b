use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

/// Session token pair returned by the `Login` mutation.
///
/// The refresh token is kept, but nothing uses it: an expired session requires a full re-login.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub auth_token: String,
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential").finish_non_exhaustive()
    }
}

/// Opaque smart battery identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Display, From, Serialize, Deserialize)]
pub struct DeviceId(String);

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

#[derive(Deserialize)]
pub struct SmartBatteryListing {
    pub id: DeviceId,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    #[serde(rename = "lastKnownStateOfCharge")]
    pub state_of_charge: Option<f64>,

    #[serde(rename = "lastKnownStatus")]
    pub status: Option<String>,

    #[serde(rename = "lastUpdate")]
    pub last_update: Option<String>,

    pub total_result: Option<f64>,
}

/// Trading sessions within the requested period, plus the period aggregates.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionWindow {
    pub device_id: Option<String>,
    pub fair_use_policy_verified: Option<bool>,
    pub period_start_date: Option<String>,
    pub period_end_date: Option<String>,
    pub period_epex_result: Option<f64>,
    pub period_frank_slim: Option<f64>,
    pub period_imbalance_result: Option<f64>,
    pub period_total_result: Option<f64>,
    pub period_trade_index: Option<f64>,
    pub period_trading_result: Option<f64>,

    /// In the order the backend returns them, which is by date ascending.
    #[serde_as(as = "serde_with::DefaultOnNull")]
    #[serde(default)]
    pub sessions: Vec<Session>,
}

impl SessionWindow {
    pub fn last_session(&self) -> Option<&Session> {
        self.sessions.last()
    }

    /// The period aggregate may be `null` even when the sessions carry cumulative figures,
    /// hence the fallback onto the last session.
    pub fn current_trading_result(&self) -> Option<f64> {
        self.period_trading_result
            .or_else(|| self.last_session().and_then(|session| session.cumulative_result))
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub date: Option<String>,
    pub cumulative_result: Option<f64>,
    pub result: Option<f64>,
    pub status: Option<String>,
    pub trade_index: Option<f64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SmartBattery {
    pub id: Option<String>,
    pub brand: Option<String>,
    pub capacity: Option<f64>,
    pub settings: Option<SmartBatterySettings>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartBatterySettings {
    pub battery_mode: Option<String>,
    pub imbalance_trading_strategy: Option<String>,
    pub self_consumption_trading_allowed: Option<bool>,
}
