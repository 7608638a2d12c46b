use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use tokio::sync::watch;

use crate::{
    api::frank_energie::{ApiError, Client, DeviceId, RawResponse},
    core::snapshot::Snapshot,
    prelude::*,
};

/// Length of the trading session history, ending now.
pub const SESSION_WINDOW: TimeDelta = TimeDelta::days(7);

/// Fetches and caches the data of a single battery.
///
/// The snapshot is published into a [`watch`] slot only after a fetch has completed,
/// so readers get the last good snapshot and never wait for an ongoing fetch.
pub struct Coordinator {
    client: Arc<Client>,
    device_id: DeviceId,
    snapshot: watch::Sender<Option<Arc<Snapshot>>>,
}

impl Coordinator {
    pub fn new(client: Arc<Client>, device_id: DeviceId) -> Self {
        Self { client, device_id, snapshot: watch::Sender::new(None) }
    }

    pub const fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Last published snapshot, `None` until the first successful refresh.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.borrow().clone()
    }

    /// Fetch the summary and the last week of sessions. Blocking.
    ///
    /// Missing or malformed nodes end up as absent data in the new snapshot.
    /// Client errors are returned, and the previous snapshot stays published.
    pub fn refresh(&self) -> Result<Arc<Snapshot>, ApiError> {
        self.refresh_at(Utc::now())
    }

    #[instrument(skip_all, fields(device_id = %self.device_id))]
    pub fn refresh_at(&self, now: DateTime<Utc>) -> Result<Arc<Snapshot>, ApiError> {
        info!("refreshing…");
        let summary_response = self.client.get_summary(&self.device_id)?;
        let sessions_response = self.client.get_sessions(
            &self.device_id,
            (now - SESSION_WINDOW).date_naive(),
            now.date_naive(),
        )?;

        let mut diagnostics = Vec::new();
        let summary = extract(&summary_response, "smartBatterySummary", &mut diagnostics);
        let sessions = extract(&sessions_response, "smartBatterySessions", &mut diagnostics);
        if sessions.is_none() {
            warn!("no `smartBatterySessions` in the response");
            diagnostics.push("no `smartBatterySessions` in the response".to_owned());
        }

        let snapshot = Arc::new(Snapshot { summary, sessions, refreshed_at: now, diagnostics });
        self.snapshot.send_replace(Some(Arc::clone(&snapshot)));
        info!(
            has_summary = snapshot.summary.is_some(),
            n_sessions = snapshot.n_sessions(),
            "refreshed",
        );
        Ok(snapshot)
    }
}

fn extract<T: DeserializeOwned>(
    response: &RawResponse,
    field: &str,
    diagnostics: &mut Vec<String>,
) -> Option<T> {
    response.node(field).unwrap_or_else(|error| {
        warn!("{error:#}");
        diagnostics.push(error.to_string());
        None
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::api::frank_energie::{TransportError, transport::fake::FakeTransport};

    fn coordinator(transport: &FakeTransport) -> Result<Coordinator> {
        let client = Client::with_transport(
            transport
                .clone()
                .respond(200, &json!({"data": {"login": {"authToken": "T", "refreshToken": "R"}}})),
        );
        client.login("u", "p")?;
        transport.take_requests();
        Ok(Coordinator::new(Arc::new(client), DeviceId::from("battery-1")))
    }

    fn summary_response() -> serde_json::Value {
        json!({
            "data": {
                "smartBatterySummary": {
                    "lastKnownStateOfCharge": 57,
                    "lastKnownStatus": "CHARGING",
                    "lastUpdate": "2024-01-02T10:15:00.000Z",
                    "totalResult": 123.45
                }
            }
        })
    }

    fn sessions_response() -> serde_json::Value {
        json!({
            "data": {
                "smartBatterySessions": {
                    "deviceId": "battery-1",
                    "periodTradingResult": null,
                    "sessions": [
                        {"date": "2024-01-01", "cumulativeResult": 10, "result": 10, "status": "COMPLETE_FINAL", "tradeIndex": 70},
                        {"date": "2024-01-02", "cumulativeResult": 15, "result": 5, "status": "COMPLETE_PRELIMINARY", "tradeIndex": 72}
                    ]
                }
            }
        })
    }

    #[test]
    fn refresh_ok() -> Result {
        let transport = FakeTransport::default();
        let coordinator = coordinator(&transport)?;
        assert!(coordinator.snapshot().is_none());

        transport.clone().respond(200, &summary_response()).respond(200, &sessions_response());
        let now = Utc.with_ymd_and_hms(2024, 3, 12, 1, 30, 0).unwrap();
        coordinator.refresh_at(now)?;

        let snapshot = coordinator.snapshot().context("no snapshot")?;
        let summary = snapshot.summary.as_ref().context("no summary")?;
        assert_eq!(summary.status.as_deref(), Some("CHARGING"));
        assert_eq!(summary.state_of_charge, Some(57.0));
        assert_eq!(snapshot.current_trading_result(), Some(15.0));
        assert!(snapshot.diagnostics.is_empty());

        let requests = transport.take_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].body["operationName"], "SmartBatterySummary");
        assert_eq!(
            requests[1].body["variables"],
            json!({"deviceId": "battery-1", "startDate": "2024-03-05", "endDate": "2024-03-12"}),
        );
        Ok(())
    }

    #[test]
    fn missing_sessions_node_is_tolerated() -> Result {
        let transport = FakeTransport::default();
        let coordinator = coordinator(&transport)?;
        transport.clone().respond(200, &summary_response()).respond(200, &json!({"data": {}}));

        let snapshot = coordinator.refresh()?;
        assert!(snapshot.sessions.is_none());
        assert!(snapshot.summary.is_some());
        assert_eq!(snapshot.current_trading_result(), None);
        assert_eq!(snapshot.diagnostics.len(), 1);
        Ok(())
    }

    #[test]
    fn empty_sessions_node_is_absent() -> Result {
        let transport = FakeTransport::default();
        let coordinator = coordinator(&transport)?;
        transport
            .clone()
            .respond(200, &summary_response())
            .respond(200, &json!({"data": {"smartBatterySessions": {}}}));

        let snapshot = coordinator.refresh()?;
        assert!(snapshot.sessions.is_none());
        assert_eq!(snapshot.diagnostics.len(), 1);
        Ok(())
    }

    #[test]
    fn malformed_summary_is_absent() -> Result {
        let transport = FakeTransport::default();
        let coordinator = coordinator(&transport)?;
        transport
            .clone()
            .respond(200, &json!({"data": {"smartBatterySummary": "oops"}}))
            .respond(200, &sessions_response());

        let snapshot = coordinator.refresh()?;
        assert!(snapshot.summary.is_none());
        assert!(snapshot.sessions.is_some());
        assert_eq!(snapshot.diagnostics.len(), 1);
        Ok(())
    }

    #[test]
    fn summary_is_replaced_not_merged() -> Result {
        let transport = FakeTransport::default();
        let coordinator = coordinator(&transport)?;
        transport
            .clone()
            .respond(200, &summary_response())
            .respond(200, &sessions_response())
            .respond(200, &json!({"data": {"smartBatterySummary": null}}))
            .respond(200, &sessions_response());

        assert!(coordinator.refresh()?.summary.is_some());
        coordinator.refresh()?;
        assert!(coordinator.snapshot().context("no snapshot")?.summary.is_none());
        Ok(())
    }

    #[test]
    fn failed_refresh_keeps_last_snapshot() -> Result {
        let transport = FakeTransport::default();
        let coordinator = coordinator(&transport)?;
        transport
            .clone()
            .respond(200, &summary_response())
            .respond(200, &sessions_response())
            .fail(TransportError::Status(502).into());

        let first = coordinator.refresh()?;
        assert!(coordinator.refresh().is_err());
        let last = coordinator.snapshot().context("no snapshot")?;
        assert!(Arc::ptr_eq(&first, &last));
        Ok(())
    }
}
