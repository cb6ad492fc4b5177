#![warn(clippy::all, rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod chart;
mod layers;
mod map;
mod maps_api;
mod query;
mod ui;

use map::map::MapState;
use map::map_tile::Coordinate;
use maps_api::backend::{BackendClient, DEFAULT_BASE_URL};
use maps_api::tile_retriever::TileRetriever;
use ui::app::{BizMapApp, MAP_WIDGET_ID};

// Initial view over the study area, matching the backend's data extent.
const HOME_CENTER: (f64, f64) = (43.7803, -79.417);
const HOME_ZOOM: f32 = 18.0;

#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result<()> {
    env_logger::init();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(egui::vec2(1600.0, 1000.0))
            .with_min_inner_size(egui::vec2(640.0, 480.0))
            .with_title("BizMap")
            .with_resizable(true),
        ..Default::default()
    };

    let base_url =
        dotenv::var("BIZMAP_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let tile_url = dotenv::var("BIZMAP_TILE_URL").ok();

    eframe::run_native(
        "BizMap",
        native_options,
        Box::new(move |cc| {
            let map_id = egui::Id::new(MAP_WIDGET_ID);
            let mut map_state = MapState::load(&cc.egui_ctx, map_id);
            if map_state.zoom() <= 0.0 {
                // No restored session; start over the study area
                map_state.set_view(
                    Coordinate::new(HOME_CENTER.0, HOME_CENTER.1),
                    HOME_ZOOM,
                );
            }
            map_state.store(&cc.egui_ctx, map_id);

            let tile_retriever = match tile_url {
                Some(url) => TileRetriever::new(url),
                None => TileRetriever::default(),
            };
            let backend = BackendClient::new(base_url.clone());
            Ok(Box::new(BizMapApp::new(cc, tile_retriever, backend)))
        }),
    )
}
