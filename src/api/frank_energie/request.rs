use chrono::NaiveDate;
use serde::Serialize;

use crate::api::frank_energie::models::DeviceId;

/// GraphQL request body.
#[derive(Serialize)]
pub struct Request<V> {
    #[serde(rename = "operationName")]
    pub operation_name: &'static str,

    pub query: &'static str,

    pub variables: V,
}

#[derive(Serialize)]
pub struct NoVariables {}

#[derive(Serialize)]
pub struct LoginVariables<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub struct DeviceVariables<'a> {
    #[serde(rename = "deviceId")]
    pub device_id: &'a DeviceId,
}

/// Dates go out as `YYYY-MM-DD`.
#[derive(Serialize)]
pub struct SessionsVariables<'a> {
    #[serde(rename = "deviceId")]
    pub device_id: &'a DeviceId,

    #[serde(rename = "startDate")]
    pub start_date: NaiveDate,

    #[serde(rename = "endDate")]
    pub end_date: NaiveDate,
}

impl<'a> Request<LoginVariables<'a>> {
    pub const fn login(email: &'a str, password: &'a str) -> Self {
        Self {
            operation_name: "Login",
            query: "mutation Login($email: String!, $password: String!) { login(email: $email, password: $password) { authToken refreshToken } }",
            variables: LoginVariables { email, password },
        }
    }
}

impl Request<NoVariables> {
    pub const fn smart_batteries() -> Self {
        Self {
            operation_name: "SmartBatteries",
            query: "query SmartBatteries { smartBatteries { id } }",
            variables: NoVariables {},
        }
    }
}

impl<'a> Request<DeviceVariables<'a>> {
    pub const fn smart_battery_summary(device_id: &'a DeviceId) -> Self {
        Self {
            operation_name: "SmartBatterySummary",
            query: "query SmartBatterySummary($deviceId: String!) { smartBatterySummary(deviceId: $deviceId) { lastKnownStateOfCharge lastKnownStatus lastUpdate totalResult } }",
            variables: DeviceVariables { device_id },
        }
    }

    pub const fn smart_battery(device_id: &'a DeviceId) -> Self {
        Self {
            operation_name: "SmartBattery",
            query: "query SmartBattery($deviceId: String!) { smartBattery(deviceId: $deviceId) { brand capacity id settings { batteryMode imbalanceTradingStrategy selfConsumptionTradingAllowed } } }",
            variables: DeviceVariables { device_id },
        }
    }
}

impl<'a> Request<SessionsVariables<'a>> {
    pub const fn smart_battery_sessions(
        device_id: &'a DeviceId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            operation_name: "SmartBatterySessions",
            query: "query SmartBatterySessions($startDate: String!, $endDate: String!, $deviceId: String!) { smartBatterySessions(startDate: $startDate, endDate: $endDate, deviceId: $deviceId) { deviceId fairUsePolicyVerified periodStartDate periodEndDate periodEpexResult periodFrankSlim periodImbalanceResult periodTotalResult periodTradeIndex periodTradingResult sessions { cumulativeResult date result status tradeIndex } } }",
            variables: SessionsVariables { device_id, start_date, end_date },
        }
    }
}
