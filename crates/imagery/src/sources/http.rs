use std::time::Duration;

use async_trait::async_trait;
use aq_common::{time::DATE_FORMAT, AqError, AqResult, GeoGrid};
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{restrict, CollectionQuery, SceneSource};
use crate::{Image, ImageCollection};

/// Path of the search operation relative to the gateway endpoint.
const SEARCH_PATH: &str = "v1/scenes/search";

/// Client for an imagery gateway exposing a JSON scene search.
///
/// `POST {endpoint}/v1/scenes/search` with a [`SearchRequest`] body answers
/// with a [`SearchResponse`]; `null` pixel values are masked.
pub struct HttpSceneSource {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
}

/// Body of a scene search.
#[derive(Debug, Serialize)]
pub struct SearchRequest<'a> {
    pub collection: &'a str,
    pub band: &'a str,
    /// `[min_x, min_y, max_x, max_y]`
    pub bbox: [f64; 4],
    /// First date, inclusive
    pub start: String,
    /// Last date, exclusive
    pub end: String,
}

/// Scenes returned by a search.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub scenes: Vec<SceneRecord>,
}

/// One scene on the wire.
#[derive(Debug, Deserialize)]
pub struct SceneRecord {
    pub id: String,
    pub date: NaiveDate,
    pub grid: GeoGrid,
    pub values: Vec<Option<f32>>,
}

impl HttpSceneSource {
    pub fn new(
        endpoint: impl Into<String>,
        api_token: Option<String>,
        timeout: Duration,
    ) -> AqResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AqError::Upstream(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_token,
        })
    }

    fn search_url(&self) -> String {
        format!("{}/{}", self.endpoint, SEARCH_PATH)
    }
}

impl SceneRecord {
    fn into_image(self, band: &str) -> AqResult<Image> {
        let data = self
            .values
            .into_iter()
            .map(|v| v.unwrap_or(f32::NAN))
            .collect();
        Image::new(self.id, Some(self.date), self.grid).with_band(band, data)
    }
}

#[async_trait]
impl SceneSource for HttpSceneSource {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, query), fields(collection = %query.collection_id, band = %query.band))]
    async fn fetch(&self, query: &CollectionQuery) -> AqResult<ImageCollection> {
        let body = SearchRequest {
            collection: &query.collection_id,
            band: &query.band,
            bbox: query.bounds.to_array(),
            start: query.window.start.format(DATE_FORMAT).to_string(),
            end: query.window.end.format(DATE_FORMAT).to_string(),
        };

        let mut request = self.client.post(self.search_url()).json(&body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AqError::Upstream(format!("scene search failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AqError::Upstream(format!(
                "scene search for {} returned {}",
                query.collection_id,
                response.status()
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| AqError::Upstream(format!("invalid scene search response: {}", e)))?;

        debug!(scenes = parsed.scenes.len(), "Scene search completed");

        let images = parsed
            .scenes
            .into_iter()
            .map(|scene| scene.into_image(&query.band))
            .collect::<AqResult<Vec<_>>>()?;
        Ok(restrict(ImageCollection::from(images), query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_trims_slash() {
        let source =
            HttpSceneSource::new("https://imagery.example/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(source.search_url(), "https://imagery.example/v1/scenes/search");
    }

    #[test]
    fn test_scene_record_masks_nulls() {
        let record: SceneRecord = serde_json::from_str(
            r#"{
                "id": "s1",
                "date": "2025-01-02",
                "grid": {"origin_x": 9.0, "origin_y": 54.0, "dx": 1.0, "dy": 1.0, "nx": 2, "ny": 1},
                "values": [1.5, null]
            }"#,
        )
        .unwrap();
        let image = record.into_image("absorbing_aerosol_index").unwrap();
        let data = image.band_data("absorbing_aerosol_index").unwrap();
        assert_eq!(data[0], 1.5);
        assert!(data[1].is_nan());
        assert_eq!(image.acquired, NaiveDate::from_ymd_opt(2025, 1, 2));
    }

    #[test]
    fn test_scene_record_length_checked() {
        let record = SceneRecord {
            id: "bad".into(),
            date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            grid: GeoGrid::new(0.0, 1.0, 1.0, 1.0, 2, 1),
            values: vec![Some(1.0)],
        };
        assert!(record.into_image("b").is_err());
    }
}
