use std::time::Duration;

use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Client, Method, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::ReportGateway;
use super::error::GatewayError;
use super::types::{
    CleanupResponse, CleanupSummary, ReportArtifact, ReportStatusSummary,
    file_name_from_disposition,
};
use crate::config::ClientConfig;
use crate::model::{CertificationDefinition, Employee, Report, ReportRequest};

/// reqwest-backed [`ReportGateway`].
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
}

impl HttpGateway {
    /// Create a gateway pointing at a custom base URL (useful for testing).
    pub fn with_base_url(base_url: &str) -> Result<Self, GatewayError> {
        Self::build(base_url, Duration::from_secs(10), Duration::from_secs(60))
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, GatewayError> {
        Self::build(
            &config.api_url,
            Duration::from_secs(config.connect_timeout_secs),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn build(
        base_url: &str,
        connect_timeout: Duration,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let base_url =
            Url::parse(base_url).map_err(|e| GatewayError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, base_url })
    }

    // Appends path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&(impl Serialize + Sync)>,
    ) -> Result<Response, GatewayError> {
        let url = self.endpoint(segments)?;
        debug!(%method, %url, "sending request");

        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = GatewayError::from_response(status, &body);
            warn!(%method, %url, status = status.as_u16(), error = %err, "request failed");
            return Err(err);
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, GatewayError> {
        let response = self.send(Method::GET, segments, None::<&()>).await?;
        decode(response).await
    }

    async fn post_json<B, T>(&self, segments: &[&str], body: &B) -> Result<T, GatewayError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self.send(Method::POST, segments, Some(body)).await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| GatewayError::Decode(e.to_string()))
}

impl ReportGateway for HttpGateway {
    async fn list_employees(&self) -> Result<Vec<Employee>, GatewayError> {
        self.get_json(&["employees"]).await
    }

    async fn list_departments(&self) -> Result<Vec<String>, GatewayError> {
        self.get_json(&["employees", "departments"]).await
    }

    async fn list_reports(&self) -> Result<Vec<Report>, GatewayError> {
        self.get_json(&["reports"]).await
    }

    async fn generate_report(&self, request: &ReportRequest) -> Result<Report, GatewayError> {
        self.post_json(&["reports", "generate"], request).await
    }

    async fn get_report(&self, report_id: &str) -> Result<Report, GatewayError> {
        self.get_json(&["reports", report_id]).await
    }

    async fn get_report_status(&self, report_id: &str) -> Result<ReportStatusSummary, GatewayError> {
        self.get_json(&["reports", report_id, "status"]).await
    }

    async fn download_report(&self, report_id: &str) -> Result<ReportArtifact, GatewayError> {
        let response = self
            .send(Method::GET, &["reports", report_id, "download"], None::<&()>)
            .await?;

        let headers = response.headers();
        let file_name = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(file_name_from_disposition)
            .unwrap_or_else(|| ReportArtifact::default_file_name(report_id));
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await?.to_vec();
        Ok(ReportArtifact {
            file_name,
            content_type,
            bytes,
        })
    }

    async fn delete_report(&self, report_id: &str) -> Result<(), GatewayError> {
        self.send(Method::DELETE, &["reports", report_id], None::<&()>)
            .await?;
        Ok(())
    }

    async fn cleanup_stuck_reports(&self) -> Result<CleanupSummary, GatewayError> {
        let response = self
            .send(Method::POST, &["reports", "cleanup", "stuck"], None::<&()>)
            .await?;
        let body: CleanupResponse = decode(response).await?;
        Ok(body.into())
    }

    async fn list_certification_definitions(
        &self,
    ) -> Result<Vec<CertificationDefinition>, GatewayError> {
        self.get_json(&["certifications", "definitions"]).await
    }

    async fn available_certifications_for_employees(
        &self,
        employee_ids: &[String],
    ) -> Result<Vec<CertificationDefinition>, GatewayError> {
        self.post_json(&["certifications", "definitions", "for-employees"], &employee_ids)
            .await
    }
}
