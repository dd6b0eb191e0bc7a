//! GeoJSON export and elevation enrichment.
//!
//! Enable the `geojson` feature to use this module.
//!
//! # Example
//!
//! ```ignore
//! use elevprof::geojson::profile_to_feature;
//!
//! let profile = service.build_profile(start, end, 120)?;
//! let feature = profile_to_feature(&profile);
//! println!("{}", feature);
//! ```

use geojson::{Feature, Geometry, JsonObject, Value as GeoJsonValue};

use crate::error::{ElevationError, Result};
use crate::point::GeoPoint;
use crate::profile::Profile;
use crate::ProfileService;

/// Convert a profile into a GeoJSON feature.
///
/// The geometry is a `LineString` whose positions are `[lon, lat, elev]`, or
/// `[lon, lat]` where a sample has no data. A single-sample (degenerate)
/// profile becomes a `Point`. Properties carry `distances_m`, `elev_m` and
/// `total_distance_m`.
pub fn profile_to_feature(profile: &Profile) -> Feature {
    let positions: Vec<Vec<f64>> = profile
        .points
        .iter()
        .zip(&profile.elev_m)
        .map(|(p, elev)| position(*p, *elev))
        .collect();

    let value = match positions.len() {
        1 => GeoJsonValue::Point(positions.into_iter().next().unwrap_or_default()),
        _ => GeoJsonValue::LineString(positions),
    };

    let mut properties = JsonObject::new();
    properties.insert(
        "total_distance_m".to_string(),
        serde_json::json!(profile.total_distance_m),
    );
    properties.insert(
        "distances_m".to_string(),
        serde_json::json!(profile.distances_m),
    );
    properties.insert("elev_m".to_string(), serde_json::json!(profile.elev_m));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Add elevations to all coordinates in a GeoJSON geometry.
///
/// Every position `[lon, lat, ...]` becomes `[lon, lat, elevation]`, or
/// `[lon, lat]` if no tile covers it. Positions are looked up in batches so
/// each tile is fetched once per geometry part.
///
/// # Errors
///
/// Returns [`ElevationError::InvalidGeometry`] if a position has fewer than
/// two elements.
pub fn add_elevations_to_geometry(
    service: &ProfileService,
    geometry: Geometry,
) -> Result<Geometry> {
    let new_value = match geometry.value {
        GeoJsonValue::Point(coord) => {
            let mut elevated = add_elevations_to_coords(service, &[coord])?;
            GeoJsonValue::Point(elevated.pop().unwrap_or_default())
        }
        GeoJsonValue::MultiPoint(coords) => {
            GeoJsonValue::MultiPoint(add_elevations_to_coords(service, &coords)?)
        }
        GeoJsonValue::LineString(coords) => {
            GeoJsonValue::LineString(add_elevations_to_coords(service, &coords)?)
        }
        GeoJsonValue::MultiLineString(lines) => {
            let elevated: Result<Vec<_>> = lines
                .iter()
                .map(|line| add_elevations_to_coords(service, line))
                .collect();
            GeoJsonValue::MultiLineString(elevated?)
        }
        GeoJsonValue::Polygon(rings) => {
            let elevated: Result<Vec<_>> = rings
                .iter()
                .map(|ring| add_elevations_to_coords(service, ring))
                .collect();
            GeoJsonValue::Polygon(elevated?)
        }
        GeoJsonValue::MultiPolygon(polygons) => {
            let elevated: Result<Vec<_>> = polygons
                .iter()
                .map(|polygon| {
                    polygon
                        .iter()
                        .map(|ring| add_elevations_to_coords(service, ring))
                        .collect::<Result<Vec<_>>>()
                })
                .collect();
            GeoJsonValue::MultiPolygon(elevated?)
        }
        GeoJsonValue::GeometryCollection(geometries) => {
            let elevated: Result<Vec<_>> = geometries
                .into_iter()
                .map(|g| add_elevations_to_geometry(service, g))
                .collect();
            GeoJsonValue::GeometryCollection(elevated?)
        }
    };

    Ok(Geometry::new(new_value))
}

fn add_elevations_to_coords(
    service: &ProfileService,
    coords: &[Vec<f64>],
) -> Result<Vec<Vec<f64>>> {
    let points = coords
        .iter()
        .map(|c| match c.as_slice() {
            [lon, lat, ..] => Ok(GeoPoint::new(*lon, *lat)),
            _ => Err(ElevationError::InvalidGeometry {
                reason: "coordinate must have at least 2 elements (lon, lat)".to_string(),
            }),
        })
        .collect::<Result<Vec<_>>>()?;

    let elevations = service.elevations_at(&points);

    Ok(points
        .into_iter()
        .zip(elevations)
        .map(|(p, elev)| position(p, elev))
        .collect())
}

fn position(p: GeoPoint, elev: Option<f64>) -> Vec<f64> {
    match elev {
        Some(e) => vec![p.lon, p.lat, e],
        None => vec![p.lon, p.lat],
    }
}
