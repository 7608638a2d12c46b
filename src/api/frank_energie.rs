pub mod error;
pub mod models;
mod request;
pub mod response;
pub mod transport;

use std::sync::{Arc, PoisonError, RwLock};

use chrono::NaiveDate;
use itertools::Itertools;
use serde::Serialize;
use url::Url;

pub use self::{
    error::{ApiError, TransportError},
    models::{Credential, DeviceId, SessionWindow, SmartBattery, Summary},
    response::RawResponse,
};
use self::{
    models::SmartBatteryListing,
    request::Request,
    transport::{Transport, UreqTransport},
};
use crate::prelude::*;

pub const DEFAULT_URL: &str = "https://frank-graphql-prod.graphcdn.app/";

/// Frank Energie GraphQL client.
///
/// Holds at most one [`Credential`], replaced as a whole on login. Each call takes its own
/// reference to the credential up front, so a concurrent login never changes it mid-flight.
pub struct Client {
    transport: Box<dyn Transport>,
    credential: RwLock<Option<Arc<Credential>>>,
}

impl Client {
    pub fn new(url: Url) -> Self {
        Self::with_transport(UreqTransport::new(url))
    }

    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self { transport: Box::new(transport), credential: RwLock::new(None) }
    }

    pub fn credential(&self) -> Option<Arc<Credential>> {
        self.credential.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential().is_some_and(|credential| !credential.auth_token.is_empty())
    }

    #[instrument(skip_all)]
    pub fn login(&self, username: &str, password: &str) -> Result<Arc<Credential>, ApiError> {
        info!("logging in…");
        let response = self.query(&Request::login(username, password))?;
        let credential = response.node::<Credential>("login").unwrap_or_else(|error| {
            warn!("{error:#}");
            None
        });
        let Some(credential) = credential else {
            return Err(ApiError::Authentication(match response.first_error() {
                Some(error) => error.message.clone().unwrap_or_else(|| "Login failed".to_owned()),
                None => "Login failed: empty response".to_owned(),
            }));
        };
        let credential = Arc::new(credential);
        *self.credential.write().unwrap_or_else(PoisonError::into_inner) =
            Some(Arc::clone(&credential));
        info!(has_refresh_token = credential.refresh_token.is_some(), "logged in");
        Ok(credential)
    }

    /// Send the request with the current bearer token, if any and not empty.
    ///
    /// GraphQL errors other than the «not authorised» one do not fail the call:
    /// the caller gets whatever partial data there is.
    #[instrument(skip_all, fields(operation = request.operation_name))]
    pub fn query<V: Serialize>(&self, request: &Request<V>) -> Result<RawResponse, ApiError> {
        let credential = self.credential();
        let body = serde_json::to_value(request)
            .map_err(|error| ApiError::MalformedResponse(format!("unserializable request: {error}")))?;
        let bearer_token = credential
            .as_ref()
            .map(|credential| credential.auth_token.as_str())
            .filter(|token| !token.is_empty());
        let response = self.transport.post_json(&body, bearer_token)?;
        if !response.is_success() {
            return Err(TransportError::Status(response.status).into());
        }
        let response = serde_json::from_str::<RawResponse>(&response.body)
            .map_err(|error| ApiError::MalformedResponse(error.to_string()))?;
        if response.is_not_authorised() {
            return Err(ApiError::Authentication("the backend rejected the token".to_owned()));
        }
        if !response.errors.is_empty() {
            debug!(
                errors = %response.errors.iter().filter_map(|error| error.message.as_deref()).join("; "),
                "GraphQL errors",
            );
        }
        Ok(response)
    }

    #[instrument(skip_all)]
    pub fn list_smart_batteries(&self) -> Result<RawResponse, ApiError> {
        self.ensure_authenticated()?;
        self.query(&Request::smart_batteries())
    }

    #[instrument(skip_all, fields(device_id = %device_id))]
    pub fn get_summary(&self, device_id: &DeviceId) -> Result<RawResponse, ApiError> {
        self.ensure_authenticated()?;
        self.query(&Request::smart_battery_summary(device_id))
    }

    #[instrument(skip_all, fields(device_id = %device_id))]
    pub fn get_smart_battery(&self, device_id: &DeviceId) -> Result<RawResponse, ApiError> {
        self.ensure_authenticated()?;
        self.query(&Request::smart_battery(device_id))
    }

    #[instrument(skip_all, fields(device_id = %device_id, %start_date, %end_date))]
    pub fn get_sessions(
        &self,
        device_id: &DeviceId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<RawResponse, ApiError> {
        self.ensure_authenticated()?;
        self.query(&Request::smart_battery_sessions(device_id, start_date, end_date))
    }

    fn ensure_authenticated(&self) -> Result<(), ApiError> {
        if self.credential().is_some() { Ok(()) } else { Err(ApiError::authentication_required()) }
    }
}

/// Extract the device identifiers from the `SmartBatteries` response.
///
/// A missing listing means no batteries. A listing of an unexpected shape is an error.
pub fn discover_device_ids(response: &RawResponse) -> Result<Vec<DeviceId>, ApiError> {
    Ok(response
        .node::<Vec<SmartBatteryListing>>("smartBatteries")?
        .unwrap_or_default()
        .into_iter()
        .map(|listing| listing.id)
        .collect())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{transport::fake::FakeTransport, *};

    fn logged_in(transport: &FakeTransport) -> Result<Client> {
        let client = Client::with_transport(
            transport
                .clone()
                .respond(200, &json!({"data": {"login": {"authToken": "T", "refreshToken": "R"}}})),
        );
        client.login("u", "p")?;
        transport.take_requests();
        Ok(client)
    }

    #[test]
    fn login_ok() -> Result {
        let transport = FakeTransport::default()
            .respond(200, &json!({"data": {"login": {"authToken": "T", "refreshToken": "R"}}}));
        let client = Client::with_transport(transport.clone());
        assert!(!client.is_authenticated());

        let credential = client.login("u", "p")?;
        assert_eq!(credential.auth_token, "T");
        assert_eq!(credential.refresh_token.as_deref(), Some("R"));
        assert!(client.is_authenticated());

        let requests = transport.take_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].body["operationName"], "Login");
        assert_eq!(requests[0].body["variables"], json!({"email": "u", "password": "p"}));
        assert_eq!(requests[0].bearer_token, None);
        Ok(())
    }

    #[test]
    fn login_error_message_ok() {
        let transport =
            FakeTransport::default().respond(200, &json!({"errors": [{"message": "bad creds"}]}));
        let client = Client::with_transport(transport);
        let error = client.login("u", "p").unwrap_err();
        assert!(matches!(&error, ApiError::Authentication(message) if message == "bad creds"));
        assert!(client.credential().is_none());
        assert!(!client.is_authenticated());
    }

    #[test]
    fn login_empty_response() {
        let client = Client::with_transport(FakeTransport::default().respond(200, &json!({})));
        let error = client.login("u", "p").unwrap_err();
        assert!(
            matches!(&error, ApiError::Authentication(message) if message == "Login failed: empty response")
        );
    }

    #[test]
    fn login_without_token_is_authentication_error() {
        for login in [json!({}), json!({"refreshToken": "R"}), json!({"authToken": null})] {
            let client = Client::with_transport(
                FakeTransport::default().respond(200, &json!({"data": {"login": login}})),
            );
            let error = client.login("u", "p").unwrap_err();
            assert!(
                matches!(&error, ApiError::Authentication(message) if message == "Login failed: empty response"),
                "{error:?}",
            );
            assert!(client.credential().is_none());
        }
    }

    #[test]
    fn empty_token_is_not_sent() -> Result {
        let transport = FakeTransport::default()
            .respond(200, &json!({"data": {"login": {"authToken": "", "refreshToken": null}}}))
            .respond(200, &json!({"data": {"smartBatteries": []}}));
        let client = Client::with_transport(transport.clone());
        client.login("u", "p")?;
        assert!(!client.is_authenticated());

        client.list_smart_batteries()?;
        let requests = transport.take_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].bearer_token, None);
        Ok(())
    }

    #[test]
    fn failed_login_keeps_credential() -> Result {
        let transport = FakeTransport::default();
        let client = logged_in(&transport)?;
        transport.clone().respond(200, &json!({"errors": [{"message": "bad creds"}]}));
        assert!(client.login("u", "wrong").is_err());
        assert_eq!(client.credential().context("credential is gone")?.auth_token, "T");
        Ok(())
    }

    #[test]
    fn not_authorised_is_authentication_error() -> Result {
        let transport = FakeTransport::default();
        let client = logged_in(&transport)?;
        transport.clone().respond(
            200,
            &json!({"data": null, "errors": [{"message": "user-error:auth-not-authorised"}]}),
        );
        let error = client.list_smart_batteries().unwrap_err();
        assert!(error.is_authentication());
        Ok(())
    }

    #[test]
    fn http_error_is_transport_error() -> Result {
        let transport = FakeTransport::default();
        let client = logged_in(&transport)?;

        // The body would have been an authentication error, had it been parsed.
        transport
            .clone()
            .respond(401, &json!({"errors": [{"message": "user-error:auth-not-authorised"}]}));
        let error = client.get_summary(&DeviceId::from("battery-1")).unwrap_err();
        assert!(matches!(error, ApiError::Transport(TransportError::Status(401))));

        transport.clone().respond(500, &json!("not even GraphQL"));
        let error = client.get_summary(&DeviceId::from("battery-1")).unwrap_err();
        assert!(matches!(error, ApiError::Transport(TransportError::Status(500))));
        Ok(())
    }

    #[test]
    fn other_graphql_errors_are_passed_through() -> Result {
        let transport = FakeTransport::default();
        let client = logged_in(&transport)?;
        transport.clone().respond(
            200,
            &json!({
                "data": {"smartBatterySummary": null},
                "errors": [{"message": "internal-error"}],
            }),
        );
        let response = client.get_summary(&DeviceId::from("battery-1"))?;
        assert_eq!(response.errors.len(), 1);
        assert!(response.node::<Summary>("smartBatterySummary")?.is_none());
        Ok(())
    }

    #[test]
    fn unauthenticated_reads_do_not_touch_network() {
        let transport = FakeTransport::default();
        let client = Client::with_transport(transport.clone());
        let device_id = DeviceId::from("battery-1");
        let date = NaiveDate::default();

        assert!(client.list_smart_batteries().unwrap_err().is_authentication());
        assert!(client.get_summary(&device_id).unwrap_err().is_authentication());
        assert!(client.get_smart_battery(&device_id).unwrap_err().is_authentication());
        assert!(client.get_sessions(&device_id, date, date).unwrap_err().is_authentication());
        assert_eq!(transport.n_requests(), 0);
    }

    #[test]
    fn bearer_token_is_sent() -> Result {
        let transport = FakeTransport::default();
        let client = logged_in(&transport)?;
        transport.clone().respond(200, &json!({"data": {"smartBattery": null}}));
        client.get_smart_battery(&DeviceId::from("battery-1"))?;
        let requests = transport.take_requests();
        assert_eq!(requests[0].bearer_token.as_deref(), Some("T"));
        assert_eq!(requests[0].body["variables"], json!({"deviceId": "battery-1"}));
        Ok(())
    }

    #[test]
    fn discover_device_ids_ok() -> Result {
        let response = serde_json::from_value::<RawResponse>(
            json!({"data": {"smartBatteries": [{"id": "a"}, {"id": "b"}]}}),
        )?;
        assert_eq!(discover_device_ids(&response)?, [DeviceId::from("a"), DeviceId::from("b")]);
        Ok(())
    }

    #[test]
    fn discover_device_ids_missing_listing() -> Result {
        let response = serde_json::from_value::<RawResponse>(json!({"data": null}))?;
        assert!(discover_device_ids(&response)?.is_empty());
        Ok(())
    }

    #[test]
    fn discover_device_ids_malformed() -> Result {
        let response = serde_json::from_value::<RawResponse>(
            json!({"data": {"smartBatteries": [{"serial": "a"}]}}),
        )?;
        assert!(matches!(discover_device_ids(&response), Err(ApiError::MalformedResponse(_))));
        Ok(())
    }
}
