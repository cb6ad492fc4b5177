use std::collections::{BTreeMap, HashSet};

use geo::{LineString, MultiPolygon, Point};
use geojson::FeatureCollection;
use serde_json::Value;

/// A single business point as served by `/api/business`.
#[derive(Debug, Clone, PartialEq)]
pub struct Business {
    pub id: i64,
    pub name: String,
    /// Lowercased `type` property; `None` when the record has no type.
    pub kind: Option<String>,
    pub location: Point<f64>,
}

impl Business {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "Business"
        } else {
            &self.name
        }
    }

    pub fn display_kind(&self) -> &str {
        self.kind.as_deref().unwrap_or("Unknown")
    }
}

/// A street centerline plus its full property bag, shown verbatim in popups.
#[derive(Debug, Clone)]
pub struct StreetFeature {
    pub line: LineString<f64>,
    pub properties: BTreeMap<String, Value>,
}

/// A building footprint plus its full property bag.
#[derive(Debug, Clone)]
pub struct BuildingFeature {
    pub footprint: MultiPolygon<f64>,
    pub properties: BTreeMap<String, Value>,
}

fn property_bag(feature: &geojson::Feature) -> BTreeMap<String, Value> {
    feature
        .properties
        .as_ref()
        .map(|props| props.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default()
}

fn to_geo_geometry(feature: geojson::Feature) -> Option<geo::Geometry<f64>> {
    let geometry = feature.geometry?;
    match geo::Geometry::<f64>::try_from(geometry.value) {
        Ok(g) => Some(g),
        Err(e) => {
            log::warn!("Skipping feature with unconvertible geometry: {e}");
            None
        }
    }
}

/// Parse `/api/streets`. LineStrings are kept as-is, MultiLineStrings are
/// flattened into one feature per part; anything else is skipped.
pub fn parse_streets(collection: FeatureCollection) -> Vec<StreetFeature> {
    let mut streets = Vec::new();
    for feature in collection.features {
        let properties = property_bag(&feature);
        match to_geo_geometry(feature) {
            Some(geo::Geometry::LineString(line)) => {
                streets.push(StreetFeature {
                    line,
                    properties,
                });
            }
            Some(geo::Geometry::MultiLineString(multi)) => {
                for line in multi {
                    streets.push(StreetFeature {
                        line,
                        properties: properties.clone(),
                    });
                }
            }
            _ => {}
        }
    }
    streets
}

/// Parse `/api/buildings`. Polygons are promoted to single-part
/// MultiPolygons; anything that is not a polygon is skipped.
pub fn parse_buildings(collection: FeatureCollection) -> Vec<BuildingFeature> {
    let mut buildings = Vec::new();
    for feature in collection.features {
        let properties = property_bag(&feature);
        let footprint = match to_geo_geometry(feature) {
            Some(geo::Geometry::Polygon(p)) => MultiPolygon::new(vec![p]),
            Some(geo::Geometry::MultiPolygon(mp)) => mp,
            _ => continue,
        };
        buildings.push(BuildingFeature {
            footprint,
            properties,
        });
    }
    buildings
}

/// Parse `/api/business` and keep only points whose lowercased `type` is in
/// the active filter set. Records without an `ogc_fid` are unusable for
/// edit/delete round trips and are dropped with a warning.
pub fn parse_businesses(
    collection: FeatureCollection,
    filter: &HashSet<String>,
) -> Vec<Business> {
    let mut businesses = Vec::new();
    for feature in collection.features {
        let properties = property_bag(&feature);
        let kind = properties
            .get("type")
            .and_then(Value::as_str)
            .map(|s| s.to_lowercase());
        let allowed = kind.as_deref().is_some_and(|k| filter.contains(k));
        if !allowed {
            continue;
        }

        let Some(id) = properties.get("ogc_fid").and_then(Value::as_i64) else {
            log::warn!("Skipping business without ogc_fid: {properties:?}");
            continue;
        };
        let name = properties
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let location = match to_geo_geometry(feature) {
            Some(geo::Geometry::Point(p)) => p,
            _ => continue,
        };

        businesses.push(Business {
            id,
            name,
            kind,
            location,
        });
    }
    businesses
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use geojson::GeoJson;

    pub fn business_collection(entries: &[(i64, &str, Option<&str>, f64, f64)]) -> FeatureCollection {
        let features: Vec<String> = entries
            .iter()
            .map(|(id, name, kind, lng, lat)| {
                let kind_prop = match kind {
                    Some(k) => format!(r#","type":"{k}""#),
                    None => String::new(),
                };
                format!(
                    r#"{{"type":"Feature","geometry":{{"type":"Point","coordinates":[{lng},{lat}]}},"properties":{{"ogc_fid":{id},"name":"{name}"{kind_prop}}}}}"#
                )
            })
            .collect();
        let raw = format!(
            r#"{{"type":"FeatureCollection","features":[{}]}}"#,
            features.join(",")
        );
        match raw.parse::<GeoJson>().unwrap() {
            GeoJson::FeatureCollection(fc) => fc,
            _ => unreachable!(),
        }
    }

    fn filter_of(kinds: &[&str]) -> HashSet<String> {
        kinds.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn businesses_filtered_by_lowercased_kind() {
        let collection = business_collection(&[
            (1, "First National", Some("Bank"), -79.41, 43.78),
            (2, "Corner Cafe", Some("cafe"), -79.42, 43.78),
            (3, "Untyped", None, -79.43, 43.78),
        ]);
        let parsed = parse_businesses(collection, &filter_of(&["bank"]));
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].id, 1);
        assert_eq!(parsed[0].kind.as_deref(), Some("bank"));
    }

    #[test]
    fn business_without_id_is_dropped() {
        let raw = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[0,0]},
             "properties":{"name":"No id","type":"bank"}}]}"#;
        let GeoJson::FeatureCollection(fc) = raw.parse::<GeoJson>().unwrap() else {
            unreachable!()
        };
        assert!(parse_businesses(fc, &filter_of(&["bank"])).is_empty());
    }

    #[test]
    fn streets_flatten_multilinestrings() {
        let raw = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"MultiLineString",
             "coordinates":[[[0,0],[1,1]],[[2,2],[3,3]]]},
             "properties":{"name":"Yonge St"}}]}"#;
        let GeoJson::FeatureCollection(fc) = raw.parse::<GeoJson>().unwrap() else {
            unreachable!()
        };
        let streets = parse_streets(fc);
        assert_eq!(streets.len(), 2);
        assert_eq!(
            streets[0].properties.get("name").and_then(Value::as_str),
            Some("Yonge St")
        );
    }

    #[test]
    fn buildings_promote_polygons() {
        let raw = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Polygon",
             "coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]},
             "properties":{"height":12}}]}"#;
        let GeoJson::FeatureCollection(fc) = raw.parse::<GeoJson>().unwrap() else {
            unreachable!()
        };
        let buildings = parse_buildings(fc);
        assert_eq!(buildings.len(), 1);
        assert_eq!(buildings[0].footprint.0.len(), 1);
    }
}
