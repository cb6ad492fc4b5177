use egui::epaint::{Color32, Pos2, Rect, Stroke};
use egui::{pos2, vec2, FontId, Response, Sense, Ui, Vec2, Widget};
use geo::{Contains, TriangulateEarcut};
use lru::LruCache;
use serde::{Deserialize, Serialize};

use super::map_tile::{project, unproject, Coordinate, MapTile, TILE_SIZE};
use crate::layers::feature::{BuildingFeature, Business, StreetFeature};
use crate::layers::icons;
use crate::query::buffer::BufferQuery;

pub const MIN_ZOOM: f32 = 1.0;
pub const MAX_ZOOM: f32 = 19.0;

/// Screen-space pick radius around a marker anchor.
const MARKER_HIT_RADIUS: f32 = 14.0;
/// Screen-space pick tolerance for street centerlines.
const STREET_HIT_TOLERANCE: f32 = 6.0;

const STREET_STROKE: Stroke = Stroke {
    width: 3.0,
    color: Color32::from_rgba_premultiplied(41, 41, 41, 204),
};
const BUILDING_FILL: Color32 = Color32::from_rgba_premultiplied(86, 108, 115, 128);
const BUILDING_STROKE: Stroke = Stroke {
    width: 1.0,
    color: Color32::from_rgb(0, 0, 255),
};
const BUFFER_FILL: Color32 = Color32::from_rgba_premultiplied(10, 27, 51, 51);
const BUFFER_STROKE: Stroke = Stroke {
    width: 2.0,
    color: Color32::from_rgb(0x33, 0x88, 0xff),
};
const NEIGHBOR_FILL: Color32 = Color32::from_rgba_premultiplied(204, 170, 34, 204);
const NEIGHBOR_STROKE: Stroke = Stroke {
    width: 1.0,
    color: Color32::from_rgb(0xff, 0x78, 0x00),
};

#[derive(Default, Clone, Serialize, Deserialize)]
pub struct MapState {
    center: Coordinate,
    zoom: f32,
    dragging: bool,
    #[serde(skip)]
    drag_start: Option<Pos2>,
}

impl MapState {
    pub fn load(ctx: &egui::Context, id: egui::Id) -> Self {
        ctx.data_mut(|d| d.get_persisted::<Self>(id).unwrap_or_default())
    }

    pub fn store(self, ctx: &egui::Context, id: egui::Id) {
        ctx.data_mut(|d| d.insert_persisted(id, self));
    }

    pub fn center(&self) -> Coordinate {
        self.center
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_view(&mut self, center: Coordinate, zoom: f32) {
        self.center = center;
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }
}

/// What a click on the map surface resolved to, topmost layer first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Business(usize),
    Building(usize),
    Street(usize),
    Ground,
}

#[derive(Debug, Clone, Copy)]
pub struct MapClick {
    pub location: Coordinate,
    pub target: ClickTarget,
    pub with_modifier: bool,
}

/// A popup bubble anchored to a geographic position so it pans with the map.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub anchor: Coordinate,
    pub lines: Vec<String>,
}

/// Borrowed views of the feature layers to paint this frame. Absent layers
/// simply do not render.
#[derive(Default)]
pub struct Overlays<'a> {
    pub streets: Option<&'a [StreetFeature]>,
    pub buildings: Option<&'a [BuildingFeature]>,
    pub businesses: Option<&'a [Business]>,
    pub selected: Option<usize>,
    pub highlighted: Option<usize>,
    pub buffer: Option<&'a BufferQuery>,
    pub user_marker: Option<Coordinate>,
    pub popup: Option<&'a Popup>,
}

pub struct Map<'a> {
    id: egui::Id,
    tile_cache: &'a mut LruCache<(u32, u32, u32), MapTile>,
    viewport_size: Vec2,
    missing_tiles: &'a mut Vec<(u32, u32, u32)>,
    overlays: Overlays<'a>,
    clicked: &'a mut Option<MapClick>,
}

impl<'a> Map<'a> {
    pub fn new(
        id_source: impl std::hash::Hash,
        tile_cache: &'a mut LruCache<(u32, u32, u32), MapTile>,
        missing_tiles: &'a mut Vec<(u32, u32, u32)>,
        clicked: &'a mut Option<MapClick>,
    ) -> Self {
        Self {
            id: egui::Id::new(id_source),
            tile_cache,
            viewport_size: Vec2::new(1024.0, 1024.0),
            missing_tiles,
            overlays: Overlays::default(),
            clicked,
        }
    }

    pub fn viewport_size(mut self, size: Vec2) -> Self {
        self.viewport_size = size;
        self
    }

    pub fn overlays(mut self, overlays: Overlays<'a>) -> Self {
        self.overlays = overlays;
        self
    }
}

impl<'a> Widget for Map<'a> {
    fn ui(mut self, ui: &mut Ui) -> Response {
        let mut state = MapState::load(ui.ctx(), self.id);

        let (rect, response) = ui.allocate_exact_size(self.viewport_size, Sense::click_and_drag());
        let painter = ui.painter().with_clip_rect(rect);
        painter.rect_filled(rect, 0.0, Color32::from_gray(40));

        // Handle panning
        if response.dragged() {
            if !state.dragging {
                state.drag_start = response.hover_pos();
                state.dragging = true;
            }
            if let (Some(current), Some(start)) = (response.hover_pos(), state.drag_start) {
                let delta = current - start;
                let (cx, cy) = project(&state.center, state.zoom as f64);
                state.center = unproject(cx - delta.x as f64, cy - delta.y as f64, state.zoom as f64);
                state.drag_start = Some(current);
            }
        } else if state.dragging {
            state.dragging = false;
            state.drag_start = None;
        }

        if response.hovered() {
            // Handle zoom for pinch / touch
            let mut zoomed = false;
            let zoom_delta = ui.input(|i| i.zoom_delta()) - 1.0;
            if zoom_delta.abs() > f32::EPSILON {
                state.zoom = (state.zoom + zoom_delta).clamp(MIN_ZOOM, MAX_ZOOM);
                zoomed = true;
            }

            // Handle zoom for scroll, tanh-normalized to one step per notch
            let mut scroll = ui.input(|i| i.smooth_scroll_delta).y;
            if scroll.abs() > f32::EPSILON && !zoomed {
                scroll = (scroll / 10.0).tanh();
                state.zoom = (state.zoom + scroll).clamp(MIN_ZOOM, MAX_ZOOM);
            }
        }

        let zoom = state.zoom as f64;
        let (center_x, center_y) = project(&state.center, zoom);
        let to_screen = |coord: &Coordinate| -> Pos2 {
            let (x, y) = project(coord, zoom);
            pos2(
                rect.center().x + (x - center_x) as f32,
                rect.center().y + (y - center_y) as f32,
            )
        };

        self.paint_tiles(ui, &painter, rect, &state, center_x, center_y);
        paint_overlays(&painter, ui, &self.overlays, &to_screen);
        painter.text(
            rect.right_bottom() + vec2(-4.0, -2.0),
            egui::Align2::RIGHT_BOTTOM,
            "© OpenStreetMap contributors",
            FontId::proportional(10.0),
            Color32::from_gray(230),
        );

        // Resolve clicks last so hit-testing sees exactly what was painted
        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let with_modifier = ui.input(|i| i.modifiers.ctrl || i.modifiers.command);
                let location = unproject(
                    center_x + (pos.x - rect.center().x) as f64,
                    center_y + (pos.y - rect.center().y) as f64,
                    zoom,
                );
                let target = hit_test(pos, location, &self.overlays, &to_screen);
                *self.clicked = Some(MapClick {
                    location,
                    target,
                    with_modifier,
                });
            }
        }

        state.store(ui.ctx(), self.id);

        response
    }
}

impl<'a> Map<'a> {
    fn paint_tiles(
        &mut self,
        ui: &Ui,
        painter: &egui::Painter,
        rect: Rect,
        state: &MapState,
        center_x: f64,
        center_y: f64,
    ) {
        let z = (state.zoom.floor() as u32).clamp(MIN_ZOOM as u32, MAX_ZOOM as u32);
        let n = 2i64.pow(z);
        // On-screen size of one tile at the current fractional zoom.
        let tile_screen = TILE_SIZE * 2.0_f64.powf(state.zoom as f64 - z as f64);

        let left = center_x - rect.width() as f64 / 2.0;
        let top = center_y - rect.height() as f64 / 2.0;

        let x_first = (left / tile_screen).floor() as i64;
        let x_last = ((left + rect.width() as f64) / tile_screen).floor() as i64;
        let y_first = (top / tile_screen).floor() as i64;
        let y_last = ((top + rect.height() as f64) / tile_screen).floor() as i64;

        for ty in y_first..=y_last {
            if ty < 0 || ty >= n {
                continue;
            }
            for tx in x_first..=x_last {
                let wrapped_x = ((tx % n) + n) % n;
                let tile_rect = Rect::from_min_size(
                    pos2(
                        rect.min.x + (tx as f64 * tile_screen - left) as f32,
                        rect.min.y + (ty as f64 * tile_screen - top) as f32,
                    ),
                    vec2(tile_screen as f32, tile_screen as f32),
                );
                let key = (z, wrapped_x as u32, ty as u32);
                if let Some(tile) = self.tile_cache.get_mut(&key) {
                    let texture = tile.texture(ui.ctx());
                    painter.image(
                        texture.id(),
                        tile_rect,
                        Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
                        Color32::WHITE,
                    );
                } else {
                    self.missing_tiles.push(key);
                    painter.rect_filled(tile_rect, 0.0, Color32::from_gray(60));
                }
            }
        }
    }
}

fn paint_overlays(
    painter: &egui::Painter,
    ui: &Ui,
    overlays: &Overlays<'_>,
    to_screen: &dyn Fn(&Coordinate) -> Pos2,
) {
    let coord_of = |p: &geo::Point<f64>| Coordinate::new(p.y(), p.x());

    if let Some(buildings) = overlays.buildings {
        for building in buildings {
            for polygon in &building.footprint {
                let (vertices, indices) = tessellate_footprint(polygon, to_screen);
                let mut mesh = egui::Mesh::default();
                for pos in vertices {
                    mesh.colored_vertex(pos, BUILDING_FILL);
                }
                mesh.indices = indices;
                painter.add(egui::Shape::mesh(mesh));

                paint_ring(painter, polygon.exterior(), to_screen);
                for interior in polygon.interiors() {
                    paint_ring(painter, interior, to_screen);
                }
            }
        }
    }

    if let Some(streets) = overlays.streets {
        for street in streets {
            let points: Vec<Pos2> = street
                .line
                .points()
                .map(|p| to_screen(&coord_of(&p)))
                .collect();
            painter.add(egui::Shape::line(points, STREET_STROKE));
        }
    }

    if let Some(buffer) = overlays.buffer {
        let points: Vec<Pos2> = buffer
            .ring
            .iter()
            .map(|p| to_screen(&coord_of(p)))
            .collect();
        painter.add(egui::Shape::convex_polygon(
            points,
            BUFFER_FILL,
            BUFFER_STROKE,
        ));
    }

    if let Some(businesses) = overlays.businesses {
        let buffer_center = overlays.buffer.map(|b| b.center_index);
        for (index, business) in businesses.iter().enumerate() {
            let highlighted = overlays.selected == Some(index)
                || overlays.highlighted == Some(index)
                || buffer_center == Some(index);
            let icon = if highlighted {
                icons::HIGHLIGHTED
            } else {
                icons::icon_for(business.kind.as_deref())
            };
            painter.text(
                to_screen(&coord_of(&business.location)),
                egui::Align2::CENTER_BOTTOM,
                icon.glyph,
                FontId::proportional(icon.size),
                icon.color,
            );
        }

        if let Some(buffer) = overlays.buffer {
            for &index in &buffer.neighbors {
                if let Some(business) = businesses.get(index) {
                    painter.circle(
                        to_screen(&coord_of(&business.location)),
                        8.0,
                        NEIGHBOR_FILL,
                        NEIGHBOR_STROKE,
                    );
                }
            }
        }
    }

    if let Some(user) = overlays.user_marker {
        let icon = icons::USER_LOCATION;
        painter.text(
            to_screen(&user),
            egui::Align2::CENTER_BOTTOM,
            icon.glyph,
            FontId::proportional(icon.size),
            icon.color,
        );
    }

    if let Some(popup) = overlays.popup {
        paint_popup(painter, ui, popup, to_screen);
    }
}

/// Footprints are routinely concave (and may carry courtyard holes), so a
/// plain convex fill would overfill them; earcut handles both.
fn tessellate_footprint(
    polygon: &geo::Polygon<f64>,
    to_screen: &dyn Fn(&Coordinate) -> Pos2,
) -> (Vec<Pos2>, Vec<u32>) {
    let triangulation = polygon.earcut_triangles_raw();
    let vertices = triangulation
        .vertices
        .chunks_exact(2)
        .map(|v| to_screen(&Coordinate::new(v[1], v[0])))
        .collect();
    let indices = triangulation
        .triangle_indices
        .iter()
        .map(|&i| i as u32)
        .collect();
    (vertices, indices)
}

fn paint_ring(
    painter: &egui::Painter,
    ring: &geo::LineString<f64>,
    to_screen: &dyn Fn(&Coordinate) -> Pos2,
) {
    let points: Vec<Pos2> = ring
        .points()
        .map(|p| to_screen(&Coordinate::new(p.y(), p.x())))
        .collect();
    painter.add(egui::Shape::line(points, BUILDING_STROKE));
}

fn paint_popup(
    painter: &egui::Painter,
    ui: &Ui,
    popup: &Popup,
    to_screen: &dyn Fn(&Coordinate) -> Pos2,
) {
    let anchor = to_screen(&popup.anchor);
    let galley = painter.layout(
        popup.lines.join("\n"),
        FontId::proportional(13.0),
        ui.visuals().strong_text_color(),
        240.0,
    );
    let size = galley.size() + vec2(16.0, 12.0);
    let bubble = Rect::from_min_size(
        pos2(anchor.x - size.x / 2.0, anchor.y - size.y - 34.0),
        size,
    );
    painter.rect(
        bubble,
        6.0,
        ui.visuals().window_fill,
        Stroke::new(1.0, ui.visuals().window_stroke.color),
    );
    painter.galley(bubble.min + vec2(8.0, 6.0), galley, ui.visuals().strong_text_color());
}

fn hit_test(
    pos: Pos2,
    location: Coordinate,
    overlays: &Overlays<'_>,
    to_screen: &dyn Fn(&Coordinate) -> Pos2,
) -> ClickTarget {
    // Markers first, closest anchor wins within the hit radius.
    if let Some(businesses) = overlays.businesses {
        let mut best: Option<(usize, f32)> = None;
        for (index, business) in businesses.iter().enumerate() {
            let anchor = to_screen(&Coordinate::new(
                business.location.y(),
                business.location.x(),
            ));
            // Glyphs are anchored bottom-center, so test against the glyph body.
            let d = pos.distance(anchor - vec2(0.0, 8.0));
            if d <= MARKER_HIT_RADIUS && best.is_none_or(|(_, bd)| d < bd) {
                best = Some((index, d));
            }
        }
        if let Some((index, _)) = best {
            return ClickTarget::Business(index);
        }
    }

    if let Some(buildings) = overlays.buildings {
        let point = geo::Point::new(location.longitude(), location.latitude());
        for (index, building) in buildings.iter().enumerate() {
            if building.footprint.contains(&point) {
                return ClickTarget::Building(index);
            }
        }
    }

    if let Some(streets) = overlays.streets {
        for (index, street) in streets.iter().enumerate() {
            let screen_points: Vec<Pos2> = street
                .line
                .points()
                .map(|p| to_screen(&Coordinate::new(p.y(), p.x())))
                .collect();
            for segment in screen_points.windows(2) {
                if distance_to_segment(pos, segment[0], segment[1]) <= STREET_HIT_TOLERANCE {
                    return ClickTarget::Street(index);
                }
            }
        }
    }

    ClickTarget::Ground
}

fn distance_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{LineString, Polygon};

    fn identity(c: &Coordinate) -> Pos2 {
        pos2(c.longitude() as f32, c.latitude() as f32)
    }

    fn triangle_area(a: Pos2, b: Pos2, c: Pos2) -> f32 {
        ((b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)).abs() / 2.0
    }

    fn triangle_contains(a: Pos2, b: Pos2, c: Pos2, p: Pos2) -> bool {
        let cross = |u: Pos2, v: Pos2, w: Pos2| (v.x - u.x) * (w.y - u.y) - (v.y - u.y) * (w.x - u.x);
        let s1 = cross(a, b, p);
        let s2 = cross(b, c, p);
        let s3 = cross(c, a, p);
        (s1 >= 0.0 && s2 >= 0.0 && s3 >= 0.0) || (s1 <= 0.0 && s2 <= 0.0 && s3 <= 0.0)
    }

    fn filled_area(vertices: &[Pos2], indices: &[u32]) -> f32 {
        indices
            .chunks_exact(3)
            .map(|t| {
                triangle_area(
                    vertices[t[0] as usize],
                    vertices[t[1] as usize],
                    vertices[t[2] as usize],
                )
            })
            .sum()
    }

    fn covers(vertices: &[Pos2], indices: &[u32], p: Pos2) -> bool {
        indices.chunks_exact(3).any(|t| {
            triangle_contains(
                vertices[t[0] as usize],
                vertices[t[1] as usize],
                vertices[t[2] as usize],
                p,
            )
        })
    }

    #[test]
    fn concave_footprint_fills_exactly_its_own_area() {
        // L-shape: the union of [0,4]x[0,1] and [0,1]x[0,3], area 6. A
        // triangle fan from the first vertex would also fill the notch.
        let l_shape = Polygon::new(
            LineString::from(vec![
                (0.0, 0.0),
                (4.0, 0.0),
                (4.0, 1.0),
                (1.0, 1.0),
                (1.0, 3.0),
                (0.0, 3.0),
                (0.0, 0.0),
            ]),
            vec![],
        );
        let (vertices, indices) = tessellate_footprint(&l_shape, &identity);
        assert_relative_eq!(filled_area(&vertices, &indices), 6.0, epsilon = 1e-4);
        // Inside the convex hull but outside the footprint.
        assert!(!covers(&vertices, &indices, pos2(2.0, 1.5)));
        assert!(covers(&vertices, &indices, pos2(0.5, 2.0)));
    }

    #[test]
    fn courtyard_hole_stays_unfilled() {
        let with_hole = Polygon::new(
            LineString::from(vec![
                (0.0, 0.0),
                (4.0, 0.0),
                (4.0, 4.0),
                (0.0, 4.0),
                (0.0, 0.0),
            ]),
            vec![LineString::from(vec![
                (1.0, 1.0),
                (3.0, 1.0),
                (3.0, 3.0),
                (1.0, 3.0),
                (1.0, 1.0),
            ])],
        );
        let (vertices, indices) = tessellate_footprint(&with_hole, &identity);
        assert_relative_eq!(filled_area(&vertices, &indices), 12.0, epsilon = 1e-4);
        assert!(!covers(&vertices, &indices, pos2(2.0, 2.0)));
        assert!(covers(&vertices, &indices, pos2(0.5, 0.5)));
    }

    #[test]
    fn segment_distance() {
        let a = pos2(0.0, 0.0);
        let b = pos2(10.0, 0.0);
        assert_relative_eq!(distance_to_segment(pos2(5.0, 3.0), a, b), 3.0);
        // Beyond the endpoints the distance is to the nearest endpoint.
        assert_relative_eq!(distance_to_segment(pos2(13.0, 4.0), a, b), 5.0);
        // Degenerate segment
        assert_relative_eq!(distance_to_segment(pos2(3.0, 4.0), a, a), 5.0);
    }

    #[test]
    fn set_view_clamps_zoom() {
        let mut state = MapState::default();
        state.set_view(Coordinate::new(43.78, -79.42), 30.0);
        assert_eq!(state.zoom(), MAX_ZOOM);
        state.set_view(Coordinate::new(43.78, -79.42), -3.0);
        assert_eq!(state.zoom(), MIN_ZOOM);
    }
}
