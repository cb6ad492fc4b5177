use serde::{Deserialize, Serialize};

/// Size of one raster tile in pixels, as served by the OSM tile endpoint.
pub const TILE_SIZE: f64 = 256.0;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Default for Coordinate {
    fn default() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
        }
    }
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Project a coordinate into Web Mercator world-pixel space at a
/// (possibly fractional) zoom level. The world is `TILE_SIZE * 2^zoom`
/// pixels wide at that zoom.
pub fn project(coord: &Coordinate, zoom: f64) -> (f64, f64) {
    let scale = TILE_SIZE * 2.0_f64.powf(zoom);
    let lat_rad = coord.latitude().to_radians();
    let x = (coord.longitude() + 180.0) / 360.0 * scale;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0 * scale;
    (x, y)
}

/// Inverse of [`project`]: world pixels back to a coordinate.
pub fn unproject(x: f64, y: f64, zoom: f64) -> Coordinate {
    let scale = TILE_SIZE * 2.0_f64.powf(zoom);
    let longitude = x / scale * 360.0 - 180.0;
    let lat_rad = (std::f64::consts::PI * (1.0 - 2.0 * y / scale)).sinh().atan();
    Coordinate::new(lat_rad.to_degrees(), longitude)
}

/// Convert a latitude and longitude to tile x, y coordinates for a given zoom.
/// Uses the Web Mercator projection.
pub fn latlng_to_tile_coords(lat: f64, lon: f64, zoom: u32) -> (u32, u32) {
    let n = 2u32.pow(zoom) as f64;
    let (x, y) = project(&Coordinate::new(lat, lon), zoom as f64);
    let x_tile = ((x / TILE_SIZE).floor() as i64).clamp(0, n as i64 - 1) as u32;
    let y_tile = ((y / TILE_SIZE).floor() as i64).clamp(0, n as i64 - 1) as u32;
    (x_tile, y_tile)
}

/// A decoded raster tile plus its lazily uploaded GPU texture.
#[derive(Deserialize, Serialize)]
pub struct MapTile {
    pub x: u32,
    pub y: u32,
    pub zoom: u32,
    width: usize,
    height: usize,
    rgba: Vec<u8>, // Decoded RGBA8 pixels
    #[serde(skip)]
    texture: Option<egui::TextureHandle>, // Uploaded on first paint, once a context exists
}

impl MapTile {
    pub fn new(x: u32, y: u32, zoom: u32, width: usize, height: usize, rgba: Vec<u8>) -> Self {
        Self {
            x,
            y,
            zoom,
            width,
            height,
            rgba,
            texture: None,
        }
    }

    pub fn texture(&mut self, ctx: &egui::Context) -> &egui::TextureHandle {
        if self.texture.is_none() {
            let color_image =
                egui::ColorImage::from_rgba_unmultiplied([self.width, self.height], &self.rgba);
            let texture = ctx.load_texture(
                format!("tile_{}_{}_zoom{}", self.x, self.y, self.zoom),
                color_image,
                egui::TextureOptions::default(),
            );
            self.texture = Some(texture);
        }
        self.texture.as_ref().expect("texture set above")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn project_unproject_roundtrip() {
        let original = Coordinate::new(43.7803, -79.417);
        let (x, y) = project(&original, 18.0);
        let back = unproject(x, y, 18.0);
        assert_relative_eq!(back.latitude(), original.latitude(), epsilon = 1e-9);
        assert_relative_eq!(back.longitude(), original.longitude(), epsilon = 1e-9);
    }

    #[test]
    fn origin_projects_to_world_center() {
        let (x, y) = project(&Coordinate::new(0.0, 0.0), 2.0);
        let world = TILE_SIZE * 4.0;
        assert_relative_eq!(x, world / 2.0);
        assert_relative_eq!(y, world / 2.0);
    }

    #[test]
    fn null_island_tile_coords() {
        // (0, 0) sits on the corner of the four center tiles; floor picks the
        // south-east one.
        assert_eq!(latlng_to_tile_coords(0.0, 0.0, 1), (1, 1));
        assert_eq!(latlng_to_tile_coords(0.0, 0.0, 4), (8, 8));
    }

    #[test]
    fn tile_coords_clamped_at_poles() {
        let (_, y) = latlng_to_tile_coords(89.9, 0.0, 3);
        assert_eq!(y, 0);
        let (_, y) = latlng_to_tile_coords(-89.9, 0.0, 3);
        assert_eq!(y, 7);
    }
}
