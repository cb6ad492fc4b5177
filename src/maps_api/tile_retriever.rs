use std::error::Error;

use serde::{Deserialize, Serialize};

use crate::map::map_tile::MapTile;

const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

// The OSM tile policy requires an identifying user agent.
const USER_AGENT: &str = concat!("bizmap/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TileRetriever {
    #[serde(skip)]
    client: reqwest::Client,
    url_template: String,
}

impl Default for TileRetriever {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_URL.to_string())
    }
}

impl TileRetriever {
    pub fn new(url_template: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url_template,
        }
    }

    /// Asynchronously fetches a raster tile and decodes it into a MapTile.
    pub async fn fetch_tile(
        &self,
        zoom: u32,
        x: u32,
        y: u32,
    ) -> Result<MapTile, Box<dyn Error + Send + Sync>> {
        let url = self
            .url_template
            .replace("{z}", &zoom.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string());
        log::debug!("Fetching tile from {url}");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(format!("Failed to fetch tile: {}", response.status()).into());
        }

        let bytes = response.bytes().await?;
        let image = image::load_from_memory(&bytes)?.to_rgba8();
        let (width, height) = image.dimensions();

        Ok(MapTile::new(
            x,
            y,
            zoom,
            width as usize,
            height as usize,
            image.into_raw(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_template_substitution() {
        let retriever = TileRetriever::default();
        let url = retriever
            .url_template
            .replace("{z}", "18")
            .replace("{x}", "73240")
            .replace("{y}", "95222");
        assert_eq!(url, "https://tile.openstreetmap.org/18/73240/95222.png");
    }
}
