use std::collections::{BTreeMap, HashSet};
use std::num::NonZeroU16;

use egui::Margin;
use lru::LruCache;
use rstar::RTree;
use tokio::sync::mpsc;

use crate::chart::{self, ChartKind};
use crate::layers::feature::{self, BuildingFeature, Business, StreetFeature};
use crate::layers::icons::BusinessKind;
use crate::map::map::{ClickTarget, Map, MapClick, MapState, Overlays, Popup};
use crate::map::map_tile::{Coordinate, MapTile};
use crate::maps_api::backend::{ApiError, BackendClient, BusinessPayload};
use crate::maps_api::tile_retriever::TileRetriever;
use crate::query::buffer::{self, BufferQuery, IndexedBusiness};
use crate::query::nearest;

/// Id of the map widget; also the key of its persisted view state.
pub const MAP_WIDGET_ID: &str = "bizmap_map";

/// Zoom used when flying to the nearest business.
const NEAREST_FLYTO_ZOOM: f32 = 18.0;

type TileResult = (u32, u32, u32, Result<MapTile, ApiError>);

/// Completed backend round trips, delivered from worker tasks to the UI
/// thread. Parsing happens on the worker; the UI only applies state.
pub enum ApiEvent {
    Streets(Result<Vec<StreetFeature>, ApiError>),
    Buildings(Result<Vec<BuildingFeature>, ApiError>),
    Businesses(Result<Vec<Business>, ApiError>),
    Saved {
        result: Result<(), ApiError>,
        was_edit: bool,
    },
    Deleted(Result<(), ApiError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditorMode {
    Add,
    Edit,
}

/// Form state of the add/edit modal. Lat/lng are kept as strings so the
/// fields can be typed into freely; they are validated on submit.
struct EditorModal {
    mode: EditorMode,
    id: Option<i64>,
    name: String,
    kind: &'static str,
    lat: String,
    lng: String,
}

pub struct BizMapApp {
    runtime: tokio::runtime::Runtime,
    tile_retriever: TileRetriever,
    backend: BackendClient,

    tile_cache: LruCache<(u32, u32, u32), MapTile>,
    pending_tiles: HashSet<(u32, u32, u32)>,
    tile_tx: mpsc::UnboundedSender<TileResult>,
    tile_rx: mpsc::UnboundedReceiver<TileResult>,
    api_tx: mpsc::UnboundedSender<ApiEvent>,
    api_rx: mpsc::UnboundedReceiver<ApiEvent>,

    streets: Option<Vec<StreetFeature>>,
    buildings: Option<Vec<BuildingFeature>>,
    businesses: Option<Vec<Business>>,
    business_index: Option<RTree<IndexedBusiness>>,
    counts: BTreeMap<String, usize>,

    show_streets: bool,
    show_buildings: bool,
    show_businesses: bool,
    filter: HashSet<String>,
    chart_kind: ChartKind,

    selection: Option<i64>,
    buffer: Option<BufferQuery>,
    nearest_hit: Option<nearest::NearestHit>,
    user_marker: Option<Coordinate>,
    awaiting_location: bool,
    popup: Option<Popup>,

    editor: Option<EditorModal>,
    alert: Option<String>,
    confirm_delete: Option<(i64, String)>,
}

impl BizMapApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        tile_retriever: TileRetriever,
        backend: BackendClient,
    ) -> Self {
        cc.egui_ctx.set_style(dark_theme(&cc.egui_ctx));
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(8)
            .thread_name("bizmap-io")
            .enable_all()
            .build()
            .expect("Unable to create runtime");
        let (tile_tx, tile_rx) = mpsc::unbounded_channel();
        let (api_tx, api_rx) = mpsc::unbounded_channel();

        let filter: HashSet<String> = BusinessKind::FILTERABLE
            .iter()
            .map(|k| k.wire_name().to_string())
            .collect();

        let app = Self {
            runtime,
            tile_retriever,
            backend,
            tile_cache: LruCache::new(NonZeroU16::new(512).unwrap_or(NonZeroU16::MAX).into()),
            pending_tiles: HashSet::new(),
            tile_tx,
            tile_rx,
            api_tx,
            api_rx,
            streets: None,
            buildings: None,
            businesses: None,
            business_index: None,
            counts: BTreeMap::new(),
            show_streets: true,
            show_buildings: true,
            show_businesses: true,
            filter,
            chart_kind: ChartKind::Pie,
            selection: None,
            buffer: None,
            nearest_hit: None,
            user_marker: None,
            awaiting_location: false,
            popup: None,
            editor: None,
            alert: None,
            confirm_delete: None,
        };

        app.spawn_streets(&cc.egui_ctx);
        app.spawn_buildings(&cc.egui_ctx);
        app.spawn_businesses(&cc.egui_ctx);
        app
    }

    fn spawn_streets(&self, ctx: &egui::Context) {
        let backend = self.backend.clone();
        let tx = self.api_tx.clone();
        let requester = ctx.clone();
        self.runtime.spawn(async move {
            let result = backend
                .fetch_layer("streets")
                .await
                .map(feature::parse_streets);
            let _ = tx.send(ApiEvent::Streets(result));
            requester.request_repaint();
        });
    }

    fn spawn_buildings(&self, ctx: &egui::Context) {
        let backend = self.backend.clone();
        let tx = self.api_tx.clone();
        let requester = ctx.clone();
        self.runtime.spawn(async move {
            let result = backend
                .fetch_layer("buildings")
                .await
                .map(feature::parse_buildings);
            let _ = tx.send(ApiEvent::Buildings(result));
            requester.request_repaint();
        });
    }

    /// Reload the business layer. Requests are never cancelled; with
    /// overlapping reloads the later response wins, which is accepted since
    /// each applies identical replace logic.
    fn spawn_businesses(&self, ctx: &egui::Context) {
        let backend = self.backend.clone();
        let tx = self.api_tx.clone();
        let filter = self.filter.clone();
        let requester = ctx.clone();
        self.runtime.spawn(async move {
            let result = backend
                .fetch_layer("business")
                .await
                .map(|fc| feature::parse_businesses(fc, &filter));
            let _ = tx.send(ApiEvent::Businesses(result));
            requester.request_repaint();
        });
    }

    fn spawn_save(&self, ctx: &egui::Context, id: Option<i64>, payload: BusinessPayload) {
        let backend = self.backend.clone();
        let tx = self.api_tx.clone();
        let requester = ctx.clone();
        self.runtime.spawn(async move {
            let result = match id {
                Some(id) => backend.update_business(id, &payload).await,
                None => backend.add_business(&payload).await,
            };
            let _ = tx.send(ApiEvent::Saved {
                result,
                was_edit: id.is_some(),
            });
            requester.request_repaint();
        });
    }

    fn spawn_delete(&self, ctx: &egui::Context, id: i64) {
        let backend = self.backend.clone();
        let tx = self.api_tx.clone();
        let requester = ctx.clone();
        self.runtime.spawn(async move {
            let result = backend.delete_business(id).await;
            let _ = tx.send(ApiEvent::Deleted(result));
            requester.request_repaint();
        });
    }

    fn apply_api_event(&mut self, ctx: &egui::Context, event: ApiEvent) {
        match event {
            ApiEvent::Streets(Ok(streets)) => self.streets = Some(streets),
            ApiEvent::Streets(Err(e)) => log::error!("Street layer error: {e}"),
            ApiEvent::Buildings(Ok(buildings)) => self.buildings = Some(buildings),
            ApiEvent::Buildings(Err(e)) => log::error!("Building layer error: {e}"),
            ApiEvent::Businesses(Ok(businesses)) => {
                self.business_index = Some(buffer::build_index(&businesses));
                self.counts = chart::count_by_kind(&businesses);
                if let Some(id) = self.selection {
                    if !businesses.iter().any(|b| b.id == id) {
                        self.selection = None;
                    }
                }
                self.businesses = Some(businesses);
                // Index-based transient state refers to the replaced layer
                self.buffer = None;
                self.nearest_hit = None;
                self.popup = None;
            }
            ApiEvent::Businesses(Err(e)) => log::error!("Business layer error: {e}"),
            ApiEvent::Saved {
                result: Ok(()),
                was_edit,
            } => {
                self.editor = None;
                if was_edit {
                    self.selection = None;
                }
                self.spawn_businesses(ctx);
            }
            ApiEvent::Saved {
                result: Err(e), ..
            } => self.alert = Some(format!("Error saving business: {e}")),
            ApiEvent::Deleted(Ok(())) => {
                self.selection = None;
                self.confirm_delete = None;
                self.spawn_businesses(ctx);
            }
            ApiEvent::Deleted(Err(e)) => {
                self.confirm_delete = None;
                self.alert = Some(format!("Error deleting business: {e}"));
            }
        }
    }

    fn selected_index(&self) -> Option<usize> {
        let id = self.selection?;
        self.businesses
            .as_deref()?
            .iter()
            .position(|b| b.id == id)
    }

    fn business_popup(business: &Business) -> Popup {
        Popup {
            anchor: Coordinate::new(business.location.y(), business.location.x()),
            lines: vec![
                business.display_name().to_string(),
                format!("Type: {}", business.display_kind()),
            ],
        }
    }

    fn property_popup(anchor: Coordinate, properties: &BTreeMap<String, serde_json::Value>) -> Popup {
        let lines = properties
            .iter()
            .map(|(key, value)| match value.as_str() {
                Some(s) => format!("{key}: {s}"),
                None => format!("{key}: {value}"),
            })
            .collect();
        Popup {
            anchor,
            lines,
        }
    }

    fn handle_click(&mut self, ctx: &egui::Context, click: MapClick) {
        if let ClickTarget::Business(index) = click.target {
            if !self.show_businesses {
                return;
            }
            if click.with_modifier {
                self.toggle_buffer(index);
            } else {
                self.select_business(index);
            }
            return;
        }

        // Non-marker clicks: the one-shot location picker has priority
        if self.awaiting_location {
            self.run_nearest(ctx, click.location);
            return;
        }

        // While the add modal is open, map clicks keep overwriting the
        // location fields
        if let Some(editor) = &mut self.editor {
            if editor.mode == EditorMode::Add {
                editor.lat = format!("{:.6}", click.location.latitude());
                editor.lng = format!("{:.6}", click.location.longitude());
                return;
            }
        }

        match click.target {
            ClickTarget::Building(index) => {
                if let Some(building) = self.buildings.as_deref().and_then(|b| b.get(index)) {
                    self.popup = Some(Self::property_popup(click.location, &building.properties));
                }
            }
            ClickTarget::Street(index) => {
                if let Some(street) = self.streets.as_deref().and_then(|s| s.get(index)) {
                    self.popup = Some(Self::property_popup(click.location, &street.properties));
                }
            }
            ClickTarget::Ground => self.popup = None,
            ClickTarget::Business(_) => unreachable!("handled above"),
        }
    }

    fn toggle_buffer(&mut self, index: usize) {
        let (Some(businesses), Some(tree)) = (self.businesses.as_deref(), &self.business_index)
        else {
            return;
        };
        self.buffer = buffer::toggle(self.buffer.take(), index, businesses, tree);
        match &self.buffer {
            Some(query) => {
                let center = &businesses[query.center_index];
                self.popup = Some(Popup {
                    anchor: Coordinate::new(center.location.y(), center.location.x()),
                    lines: vec![
                        center.display_name().to_string(),
                        format!("Type: {}", center.display_kind()),
                        format!(
                            "{} nearby businesses within {:.0}m",
                            query.neighbors.len(),
                            query.radius_m
                        ),
                        "Click again to clear".to_string(),
                    ],
                });
            }
            None => self.popup = None,
        }
    }

    fn select_business(&mut self, index: usize) {
        let Some(business) = self.businesses.as_deref().and_then(|b| b.get(index)) else {
            return;
        };
        self.selection = Some(business.id);
        self.popup = Some(Self::business_popup(business));
    }

    fn run_nearest(&mut self, ctx: &egui::Context, location: Coordinate) {
        self.awaiting_location = false;
        self.user_marker = Some(location);
        self.popup = Some(Popup {
            anchor: location,
            lines: vec!["Your location".to_string()],
        });

        let Some(businesses) = self.businesses.as_deref() else {
            return;
        };
        let from = geo::Point::new(location.longitude(), location.latitude());
        if let Some(hit) = nearest::find(businesses, from) {
            let business = &businesses[hit.index];
            self.nearest_hit = Some(hit);
            self.popup = Some(Popup {
                anchor: Coordinate::new(business.location.y(), business.location.x()),
                lines: vec![
                    business.display_name().to_string(),
                    format!("Type: {}", business.display_kind()),
                    format!("Distance: {}", nearest::format_distance(hit.distance_m)),
                    "Nearest to your location".to_string(),
                ],
            });

            let map_id = egui::Id::new(MAP_WIDGET_ID);
            let mut state = MapState::load(ctx, map_id);
            state.set_view(
                Coordinate::new(business.location.y(), business.location.x()),
                NEAREST_FLYTO_ZOOM,
            );
            state.store(ctx, map_id);
        }
    }

    fn arm_nearest(&mut self) {
        if self.businesses.is_none() || !self.show_businesses {
            self.alert = Some("Please enable businesses layer first!".to_string());
            return;
        }
        self.alert = Some("Please click on the map to specify your current location".to_string());
        self.user_marker = None;
        self.nearest_hit = None;
        self.buffer = None;
        self.awaiting_location = true;
    }

    fn open_add_modal(&mut self, ctx: &egui::Context) {
        let state = MapState::load(ctx, egui::Id::new(MAP_WIDGET_ID));
        let center = state.center();
        self.editor = Some(EditorModal {
            mode: EditorMode::Add,
            id: None,
            name: String::new(),
            kind: BusinessKind::Store.wire_name(),
            lat: format!("{:.6}", center.latitude()),
            lng: format!("{:.6}", center.longitude()),
        });
    }

    fn open_edit_modal(&mut self) {
        let index = match require_selection(self.selected_index()) {
            Ok(index) => index,
            Err(message) => {
                self.alert = Some(message.to_string());
                return;
            }
        };
        let business = &self.businesses.as_deref().expect("selection implies layer")[index];
        let kind = BusinessKind::from_kind(business.kind.as_deref()).wire_name();
        self.editor = Some(EditorModal {
            mode: EditorMode::Edit,
            id: Some(business.id),
            name: business.name.clone(),
            kind,
            lat: format!("{:.6}", business.location.y()),
            lng: format!("{:.6}", business.location.x()),
        });
    }

    fn request_delete(&mut self) {
        let index = match require_selection(self.selected_index()) {
            Ok(index) => index,
            Err(message) => {
                self.alert = Some(message.to_string());
                return;
            }
        };
        let business = &self.businesses.as_deref().expect("selection implies layer")[index];
        self.confirm_delete = Some((business.id, business.display_name().to_string()));
    }

    fn submit_editor(&mut self, ctx: &egui::Context) {
        let Some(editor) = &self.editor else {
            return;
        };
        if editor.name.trim().is_empty() {
            self.alert = Some("Name is required".to_string());
            return;
        }
        let (Ok(lat), Ok(lng)) = (editor.lat.trim().parse::<f64>(), editor.lng.trim().parse::<f64>())
        else {
            self.alert = Some("Latitude and longitude must be numbers".to_string());
            return;
        };
        let payload = BusinessPayload {
            name: editor.name.trim().to_string(),
            kind: editor.kind.to_string(),
            lat,
            lng,
        };
        // Modal stays open until the backend confirms; failure keeps it up
        self.spawn_save(ctx, editor.id, payload);
    }

    fn side_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("controls")
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.heading("Layers");
                ui.checkbox(&mut self.show_streets, "Streets");
                ui.checkbox(&mut self.show_buildings, "Buildings");
                if ui.checkbox(&mut self.show_businesses, "Businesses").changed()
                    && !self.show_businesses
                {
                    // Hiding the layer also drops any active buffer
                    self.buffer = None;
                    self.popup = None;
                }

                ui.separator();
                ui.heading("Business types");
                for kind in BusinessKind::FILTERABLE {
                    let wire = kind.wire_name();
                    let mut checked = self.filter.contains(wire);
                    if ui.checkbox(&mut checked, chart::bucket_label(wire)).changed() {
                        if checked {
                            self.filter.insert(wire.to_string());
                        } else {
                            self.filter.remove(wire);
                        }
                        self.buffer = None;
                        self.spawn_businesses(ctx);
                    }
                }

                ui.separator();
                if ui.button("Find nearest business").clicked() {
                    self.arm_nearest();
                }
                if ui.button("Clear buffer").clicked() {
                    clear_buffer(&mut self.buffer, &mut self.popup);
                }

                ui.separator();
                ui.heading("Manage businesses");
                ui.horizontal(|ui| {
                    if ui.button("Add").clicked() {
                        self.open_add_modal(ctx);
                    }
                    if ui.button("Edit").clicked() {
                        self.open_edit_modal();
                    }
                    if ui.button("Delete").clicked() {
                        self.request_delete();
                    }
                });

                ui.separator();
                ui.heading("Businesses by type");
                if ui.button(self.chart_kind.toggle_label()).clicked() {
                    self.chart_kind = self.chart_kind.toggled();
                    // Full reload, not just a redraw; counts are idempotent
                    self.spawn_businesses(ctx);
                }
                chart::draw(ui, self.chart_kind, &self.counts);
            });
    }

    fn map_panel(&mut self, ctx: &egui::Context) {
        let frame = egui::Frame {
            fill: egui::Color32::TRANSPARENT,
            inner_margin: Margin::same(0.0),
            outer_margin: Margin::same(0.0),
            ..Default::default()
        };
        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            ui.style_mut().debug.debug_on_hover = false;

            let overlays = Overlays {
                streets: self.show_streets.then_some(()).and(self.streets.as_deref()),
                buildings: self
                    .show_buildings
                    .then_some(())
                    .and(self.buildings.as_deref()),
                businesses: self
                    .show_businesses
                    .then_some(())
                    .and(self.businesses.as_deref()),
                selected: self.selected_index(),
                highlighted: self.nearest_hit.map(|hit| hit.index),
                buffer: self.buffer.as_ref(),
                user_marker: self.user_marker,
                popup: self.popup.as_ref(),
            };

            let mut missing_tiles = Vec::new();
            let mut clicked = None;
            let map = Map::new(
                MAP_WIDGET_ID,
                &mut self.tile_cache,
                &mut missing_tiles,
                &mut clicked,
            )
            .viewport_size(ui.available_size())
            .overlays(overlays);
            ui.add(map);

            if let Some(click) = clicked {
                self.handle_click(ctx, click);
            }

            for key in missing_tiles {
                if !self.pending_tiles.contains(&key) && self.tile_cache.peek(&key).is_none() {
                    let sender = self.tile_tx.clone();
                    let tile_retriever = self.tile_retriever.clone();
                    let requester = ctx.clone();
                    let (z, x, y) = key;

                    self.runtime.spawn(async move {
                        let result = tile_retriever.fetch_tile(z, x, y).await;
                        let _ = sender.send((z, x, y, result));
                        requester.request_repaint();
                    });

                    self.pending_tiles.insert(key);
                }
            }
        });
    }

    fn dialogs(&mut self, ctx: &egui::Context) {
        if let Some(message) = self.alert.clone() {
            egui::Window::new("Notice")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, -120.0])
                .show(ctx, |ui| {
                    ui.label(message);
                    if ui.button("OK").clicked() {
                        self.alert = None;
                    }
                });
        }

        if let Some((id, name)) = self.confirm_delete.clone() {
            egui::Window::new("Confirm delete")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, -120.0])
                .show(ctx, |ui| {
                    ui.label(format!("Are you sure you want to delete \"{name}\"?"));
                    ui.horizontal(|ui| {
                        if ui.button("Delete").clicked() {
                            self.spawn_delete(ctx, id);
                        }
                        if ui.button("Cancel").clicked() {
                            self.confirm_delete = None;
                        }
                    });
                });
        }

        self.editor_window(ctx);
    }

    fn editor_window(&mut self, ctx: &egui::Context) {
        let Some(editor) = &mut self.editor else {
            return;
        };
        let title = match editor.mode {
            EditorMode::Add => "Add new business",
            EditorMode::Edit => "Edit business",
        };
        let mut open = true;
        let mut submitted = false;
        let mut cancelled = false;

        egui::Window::new(title)
            .id(egui::Id::new("business_editor"))
            .collapsible(false)
            .resizable(false)
            .open(&mut open)
            .show(ctx, |ui| {
                if let Some(id) = editor.id {
                    ui.label(format!("ID: {id}"));
                }
                ui.horizontal(|ui| {
                    ui.label("Name:");
                    ui.text_edit_singleline(&mut editor.name);
                });
                ui.horizontal(|ui| {
                    ui.label("Type:");
                    egui::ComboBox::from_id_salt("business_kind")
                        .selected_text(chart::bucket_label(editor.kind))
                        .show_ui(ui, |ui| {
                            for kind in BusinessKind::FILTERABLE {
                                let wire = kind.wire_name();
                                ui.selectable_value(
                                    &mut editor.kind,
                                    wire,
                                    chart::bucket_label(wire),
                                );
                            }
                        });
                });
                // Location is only editable when adding
                if editor.mode == EditorMode::Add {
                    ui.horizontal(|ui| {
                        ui.label("Latitude:");
                        ui.text_edit_singleline(&mut editor.lat);
                    });
                    ui.horizontal(|ui| {
                        ui.label("Longitude:");
                        ui.text_edit_singleline(&mut editor.lng);
                    });
                    ui.weak("Click the map to set the location");
                }
                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        submitted = true;
                    }
                    if ui.button("Cancel").clicked() {
                        cancelled = true;
                    }
                });
            });

        if !open || cancelled {
            // Closing the modal also ends the add-mode map-click updates
            self.editor = None;
        } else if submitted {
            self.submit_editor(ctx);
        }
    }
}

impl eframe::App for BizMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Apply completed tile fetches
        while let Ok((z, x, y, result)) = self.tile_rx.try_recv() {
            self.pending_tiles.remove(&(z, x, y));
            match result {
                Ok(tile) => {
                    self.tile_cache.put((z, x, y), tile);
                }
                Err(e) => log::warn!("Error fetching tile ({z}, {x}, {y}): {e}"),
            }
        }

        // Apply completed backend round trips
        while let Ok(event) = self.api_rx.try_recv() {
            self.apply_api_event(ctx, event);
        }

        self.side_panel(ctx);
        self.map_panel(ctx);
        self.dialogs(ctx);
    }
}

/// Edit and delete both require a prior selection; without one the caller
/// shows the alert text and sends no request.
fn require_selection(selected: Option<usize>) -> Result<usize, &'static str> {
    selected.ok_or("Please select a business first by clicking on it")
}

/// Clearing an idle buffer changes nothing; an active one goes away along
/// with the count popup attached to its center.
fn clear_buffer(buffer: &mut Option<BufferQuery>, popup: &mut Option<Popup>) {
    if buffer.take().is_some() {
        *popup = None;
    }
}

fn dark_theme(ctx: &egui::Context) -> egui::Style {
    use egui::{Color32, FontFamily, FontId, Stroke, TextStyle};

    let mut style = (*ctx.style()).clone();
    style.text_styles = [
        (TextStyle::Heading, FontId::new(18.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(13.0, FontFamily::Monospace)),
        (TextStyle::Button, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Small, FontId::new(11.0, FontFamily::Proportional)),
    ]
    .into();

    let panel_color = Color32::from_rgb(32, 33, 36);
    style.visuals = egui::Visuals::dark();
    style.visuals.override_text_color = Some(Color32::LIGHT_GRAY);
    style.visuals.panel_fill = panel_color;
    style.visuals.window_fill = panel_color;
    style.visuals.window_stroke = Stroke::new(1.0, Color32::from_gray(60));
    style.spacing.item_spacing = egui::vec2(6.0, 6.0);
    style.spacing.button_padding = egui::vec2(6.0, 3.0);
    style
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_popup() -> Popup {
        Popup {
            anchor: Coordinate::new(43.7803, -79.417),
            lines: vec!["Corner Cafe".to_string()],
        }
    }

    #[test]
    fn edit_and_delete_require_a_selection() {
        assert_eq!(require_selection(Some(2)), Ok(2));
        assert_eq!(
            require_selection(None),
            Err("Please select a business first by clicking on it")
        );
    }

    #[test]
    fn clearing_an_idle_buffer_is_a_noop() {
        let mut buffer = None;
        let mut popup = Some(sample_popup());
        clear_buffer(&mut buffer, &mut popup);
        assert!(buffer.is_none());
        // An unrelated popup stays open
        assert_eq!(popup, Some(sample_popup()));
    }

    #[test]
    fn clearing_an_active_buffer_drops_query_and_popup() {
        let mut buffer = Some(BufferQuery {
            center_index: 0,
            radius_m: buffer::BUFFER_RADIUS_M,
            ring: Vec::new(),
            neighbors: vec![1, 2],
        });
        let mut popup = Some(sample_popup());
        clear_buffer(&mut buffer, &mut popup);
        assert!(buffer.is_none());
        assert!(popup.is_none());
    }
}
