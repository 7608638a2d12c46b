use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::{api::frank_energie::DeviceId, core::snapshot::Snapshot};

const DOMAIN: &str = "frank_energie_slim";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SensorKind {
    Status,
    TradingResult,
}

/// Read-through view of a coordinator snapshot.
#[derive(Clone, Debug)]
pub struct Sensor {
    kind: SensorKind,
    device_id: DeviceId,
}

#[must_use]
#[derive(Debug, Serialize)]
pub struct Reading {
    pub name: String,
    pub unique_id: String,
    pub state: Value,
    pub attributes: Map<String, Value>,
}

impl Sensor {
    pub fn for_device(device_id: &DeviceId) -> [Self; 2] {
        [
            Self { kind: SensorKind::Status, device_id: device_id.clone() },
            Self { kind: SensorKind::TradingResult, device_id: device_id.clone() },
        ]
    }

    pub fn name(&self) -> String {
        match self.kind {
            SensorKind::Status => format!("Frank Smart Battery {} Status", self.device_id),
            SensorKind::TradingResult => {
                format!("Frank Smart Battery {} Trading Result", self.device_id)
            }
        }
    }

    pub fn unique_id(&self) -> String {
        match self.kind {
            SensorKind::Status => format!("{DOMAIN}_{}_status", self.device_id),
            SensorKind::TradingResult => format!("{DOMAIN}_{}_trading_result", self.device_id),
        }
    }

    pub fn read(&self, snapshot: Option<&Snapshot>) -> Reading {
        let (state, attributes) = match self.kind {
            SensorKind::Status => {
                let summary = snapshot.and_then(|snapshot| snapshot.summary.as_ref());
                (
                    json!(summary.and_then(|summary| summary.status.as_deref())),
                    Map::from_iter([
                        ("soc".to_owned(), json!(summary.and_then(|it| it.state_of_charge))),
                        (
                            "last_update".to_owned(),
                            json!(summary.and_then(|it| it.last_update.as_deref())),
                        ),
                        ("total_result".to_owned(), json!(summary.and_then(|it| it.total_result))),
                    ]),
                )
            }
            SensorKind::TradingResult => {
                let last_session = snapshot.and_then(Snapshot::last_session);
                (
                    json!(snapshot.and_then(Snapshot::current_trading_result)),
                    Map::from_iter([
                        ("sessions_count".to_owned(), json!(snapshot.map_or(0, Snapshot::n_sessions))),
                        (
                            "last_session_result".to_owned(),
                            json!(last_session.and_then(|session| session.result)),
                        ),
                        (
                            "last_session_status".to_owned(),
                            json!(last_session.and_then(|session| session.status.as_deref())),
                        ),
                    ]),
                )
            }
        };
        Reading { name: self.name(), unique_id: self.unique_id(), state, attributes }
    }
}
