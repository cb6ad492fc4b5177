use std::error::Error;

use geojson::{FeatureCollection, GeoJson};
use serde::{Deserialize, Serialize};

pub type ApiError = Box<dyn Error + Send + Sync>;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Body for both create and update, matching the backend contract:
/// `{name, type, lat, lng}`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BusinessPayload {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub lat: f64,
    pub lng: f64,
}

/// Client for the business REST backend. Cheap to clone into spawned tasks.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn layer_url(&self, layer: &str) -> String {
        format!("{}/api/{layer}", self.base_url)
    }

    fn add_url(&self) -> String {
        format!("{}/api/business/add", self.base_url)
    }

    fn update_url(&self, id: i64) -> String {
        format!("{}/api/business/update/{id}", self.base_url)
    }

    fn delete_url(&self, id: i64) -> String {
        format!("{}/api/business/delete/{id}", self.base_url)
    }

    /// Fetch one layer (`streets`, `buildings` or `business`) as a GeoJSON
    /// FeatureCollection.
    pub async fn fetch_layer(&self, layer: &str) -> Result<FeatureCollection, ApiError> {
        let url = self.layer_url(layer);
        log::debug!("Fetching layer from {url}");
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(format!("Failed to fetch {layer}: {}", response.status()).into());
        }
        let body = response.text().await?;
        match body.parse::<GeoJson>()? {
            GeoJson::FeatureCollection(fc) => Ok(fc),
            other => Err(format!("Expected a FeatureCollection for {layer}, got {other}").into()),
        }
    }

    pub async fn add_business(&self, payload: &BusinessPayload) -> Result<(), ApiError> {
        let response = self.client.post(self.add_url()).json(payload).send().await?;
        Self::check_crud_response(response).await
    }

    pub async fn update_business(&self, id: i64, payload: &BusinessPayload) -> Result<(), ApiError> {
        let response = self
            .client
            .put(self.update_url(id))
            .json(payload)
            .send()
            .await?;
        Self::check_crud_response(response).await
    }

    pub async fn delete_business(&self, id: i64) -> Result<(), ApiError> {
        let response = self.client.delete(self.delete_url(id)).send().await?;
        Self::check_crud_response(response).await
    }

    /// CRUD failures surface the raw backend response text to the user, so
    /// keep the body instead of just the status code.
    async fn check_crud_response(response: reqwest::Response) -> Result<(), ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        if body.is_empty() {
            Err(format!("Request failed: {status}").into())
        } else {
            Err(body.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_urls() {
        let client = BackendClient::new("http://localhost:5000/".to_string());
        assert_eq!(client.layer_url("streets"), "http://localhost:5000/api/streets");
        assert_eq!(client.layer_url("business"), "http://localhost:5000/api/business");
        assert_eq!(client.add_url(), "http://localhost:5000/api/business/add");
        assert_eq!(client.update_url(7), "http://localhost:5000/api/business/update/7");
        assert_eq!(client.delete_url(7), "http://localhost:5000/api/business/delete/7");
    }

    #[test]
    fn payload_wire_shape() {
        let payload = BusinessPayload {
            name: "Test".to_string(),
            kind: "store".to_string(),
            lat: 43.78,
            lng: -79.42,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "Test", "type": "store", "lat": 43.78, "lng": -79.42})
        );
    }
}
