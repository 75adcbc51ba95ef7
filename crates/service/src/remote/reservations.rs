use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use super::{transport_error, ServiceResolver, REMOTE_CALLS_TOTAL};
use crate::errors::ServiceError;

/// Existence checks answered by the reservations service.
///
/// Failures are returned as-is (`Remote` / `RemoteUnavailable`); no retry, no caching.
#[async_trait]
pub trait ReservationClient: Send + Sync {
    /// `GET /id-habitacion/{id}`: whether any reservation references the room.
    async fn room_is_present(&self, id: i64) -> Result<bool, ServiceError>;

    /// `GET /id-huesped/{id}`: whether any reservation references the guest.
    async fn guest_is_present(&self, id: i64) -> Result<bool, ServiceError>;
}

/// reqwest-backed client resolving its base URL on every call.
pub struct HttpReservationClient {
    http: reqwest::Client,
    resolver: Arc<dyn ServiceResolver>,
    service: String,
}

impl HttpReservationClient {
    pub fn new(http: reqwest::Client, resolver: Arc<dyn ServiceResolver>) -> Self {
        Self { http, resolver, service: configs::RESERVATIONS_SERVICE.to_string() }
    }

    /// Build the HTTP client with the configured connect/request timeouts.
    pub fn from_config(
        cfg: &configs::RemoteConfig,
        resolver: Arc<dyn ServiceResolver>,
    ) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .connect_timeout(cfg.connect_timeout())
            .timeout(cfg.request_timeout())
            .build()
            .map_err(|e| ServiceError::Other(anyhow::anyhow!("build http client: {e}")))?;
        Ok(Self::new(http, resolver))
    }

    #[instrument(skip(self), fields(service = %self.service))]
    async fn is_present(&self, resource: &str, id: i64) -> Result<bool, ServiceError> {
        let base = self.resolver.resolve(&self.service).inspect_err(|_| {
            REMOTE_CALLS_TOTAL.with_label_values(&[self.service.as_str(), "unresolved"]).inc();
        })?;
        let url = format!("{base}/{resource}/{id}");
        debug!(%url, "existence check");

        let resp = self.http.get(&url).send().await.map_err(|e| {
            REMOTE_CALLS_TOTAL.with_label_values(&[self.service.as_str(), "no_response"]).inc();
            transport_error(&self.service, &e)
        })?;

        let status = resp.status();
        if !status.is_success() {
            REMOTE_CALLS_TOTAL.with_label_values(&[self.service.as_str(), "error_status"]).inc();
            warn!(%url, status = status.as_u16(), "existence check rejected");
            return Err(ServiceError::remote(
                &self.service,
                Some(status.as_u16()),
                format!("GET /{resource}/{id} returned {status}"),
            ));
        }

        let present = resp.json::<bool>().await.map_err(|e| {
            REMOTE_CALLS_TOTAL.with_label_values(&[self.service.as_str(), "bad_body"]).inc();
            ServiceError::remote(&self.service, None, format!("unreadable existence answer: {e}"))
        })?;
        REMOTE_CALLS_TOTAL.with_label_values(&[self.service.as_str(), "ok"]).inc();
        Ok(present)
    }
}

#[async_trait]
impl ReservationClient for HttpReservationClient {
    async fn room_is_present(&self, id: i64) -> Result<bool, ServiceError> {
        self.is_present("id-habitacion", id).await
    }

    async fn guest_is_present(&self, id: i64) -> Result<bool, ServiceError> {
        self.is_present("id-huesped", id).await
    }
}
