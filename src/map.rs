use std::{
    fs, io,
    path::{Path, PathBuf},
};

use strum::Display;
use thiserror::Error;
use tracing::{debug, error};

use crate::{config::MapConfig, object::GeodeticPosition};

const LEAFLET_JS: &str = "https://cdn.jsdelivr.net/npm/leaflet@1.9.3/dist/leaflet.js";
const LEAFLET_CSS: &str = "https://cdn.jsdelivr.net/npm/leaflet@1.9.3/dist/leaflet.css";
const AWESOME_MARKERS_JS: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/Leaflet.awesome-markers/2.0.2/leaflet.awesome-markers.js";
const AWESOME_MARKERS_CSS: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/Leaflet.awesome-markers/2.0.2/leaflet.awesome-markers.css";
const GLYPHICONS_CSS: &str = "https://netdna.bootstrapcdn.com/bootstrap/3.0.0/css/bootstrap-glyphicons.css";
const TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
const TILE_ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("failed to write {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Color {
    Red,
    Crimson,
}

#[derive(Clone, PartialEq, Debug)]
pub enum Marker {
    /// Map pin with an icon.
    Pin {
        location: [f64; 2],
        popup: String,
        color: Color,
        icon: &'static str,
    },
    /// Circle with a fixed on-screen radius in px.
    Circle {
        location: [f64; 2],
        popup: String,
        radius: u32,
        color: Color,
        fill: bool,
    },
}

/// A standalone HTML map document.
#[derive(Clone, PartialEq, Debug)]
pub struct MapArtifact {
    pub title: String,
    pub center: [f64; 2],
    pub zoom: u8,
    pub markers: Vec<Marker>,
}

/// Name of the file the map of `satellite_id` is saved to.
pub fn file_name(satellite_id: u64) -> String {
    format!("{}_location_map.html", satellite_id)
}

/// Builds the map of a satellite's current ground position.
pub fn render(
    position: &GeodeticPosition,
    name: &str,
    place: Option<&str>,
    config: &MapConfig,
) -> Result<MapArtifact, RenderError> {
    let latitude = position.latitude_degrees;
    let longitude = position.longitude_degrees;

    let valid = latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude);
    if !valid {
        let err = RenderError::InvalidCoordinate {
            latitude,
            longitude,
        };
        error!("Error creating map: {err}");
        return Err(err);
    }

    let location = [latitude, longitude];
    Ok(MapArtifact {
        title: format!("{} location", name),
        center: location,
        zoom: config.zoom,
        markers: vec![
            Marker::Pin {
                location,
                popup: popup_text(name, latitude, longitude, place),
                color: Color::Red,
                icon: "info-sign",
            },
            Marker::Circle {
                location,
                popup: escape_html(name),
                radius: 10,
                color: Color::Crimson,
                fill: true,
            },
        ],
    })
}

fn popup_text(name: &str, latitude: f64, longitude: f64, place: Option<&str>) -> String {
    let mut text = format!(
        "{}<br>Lat: {:.2}°, Lon: {:.2}°",
        escape_html(name),
        latitude,
        longitude
    );
    if let Some(place) = place {
        text += &format!("<br>Near: {}", escape_html(place));
    }
    text
}

impl MapArtifact {
    pub fn to_html(&self) -> String {
        let [lat, lon] = self.center;

        let mut html = format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0, maximum-scale=1.0, user-scalable=no" />
    <title>{title}</title>
    <link rel="stylesheet" href="{LEAFLET_CSS}" />
    <link rel="stylesheet" href="{AWESOME_MARKERS_CSS}" />
    <link rel="stylesheet" href="{GLYPHICONS_CSS}" />
    <script src="{LEAFLET_JS}"></script>
    <script src="{AWESOME_MARKERS_JS}"></script>
    <style>
        html, body, #map {{ width: 100%; height: 100%; margin: 0; padding: 0; }}
    </style>
</head>
<body>
    <div id="map"></div>
    <script>
        var map = L.map("map", {{ center: [{lat}, {lon}], zoom: {zoom} }});
        L.tileLayer({tile_url}, {{ maxZoom: 19, attribution: {attribution} }}).addTo(map);
"#,
            title = escape_html(&self.title),
            zoom = self.zoom,
            tile_url = js_string(TILE_URL),
            attribution = js_string(TILE_ATTRIBUTION),
        );

        for marker in &self.markers {
            let line = match marker {
                Marker::Pin {
                    location: [lat, lon],
                    popup,
                    color,
                    icon,
                } => format!(
                    r#"        L.marker([{lat}, {lon}], {{ icon: L.AwesomeMarkers.icon({{ icon: {icon}, prefix: "glyphicon", markerColor: {color}, iconColor: "white" }}) }}).bindPopup({popup}).addTo(map);"#,
                    icon = js_string(icon),
                    color = js_string(&color.to_string()),
                    popup = js_string(popup),
                ),
                Marker::Circle {
                    location: [lat, lon],
                    popup,
                    radius,
                    color,
                    fill,
                } => format!(
                    r#"        L.circleMarker([{lat}, {lon}], {{ radius: {radius}, color: {color}, fill: {fill}, fillColor: {color} }}).bindPopup({popup}).addTo(map);"#,
                    color = js_string(&color.to_string()),
                    popup = js_string(popup),
                ),
            };
            html.push_str(&line);
            html.push('\n');
        }

        html.push_str("    </script>\n</body>\n</html>\n");
        html
    }

    /// Writes the document to `{satellite_id}_location_map.html` in `dir`, replacing any previous one.
    pub fn save(&self, dir: &Path, satellite_id: u64) -> Result<PathBuf, RenderError> {
        let path = dir.join(file_name(satellite_id));
        fs::write(&path, self.to_html()).map_err(|source| {
            let err = RenderError::Io {
                path: path.clone(),
                source,
            };
            error!("Error saving map: {err}");
            err
        })?;
        debug!(path = %path.display(), "map saved");
        Ok(path)
    }
}

/// Quotes `text` as a JavaScript string literal that is safe inside a `<script>` element.
fn js_string(text: &str) -> String {
    serde_json::Value::from(text)
        .to_string()
        .replace("</", "<\\/")
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn position(latitude: f64, longitude: f64) -> GeodeticPosition {
        GeodeticPosition {
            time: Utc::now(),
            latitude_degrees: latitude,
            longitude_degrees: longitude,
            elevation_km: 420.0,
        }
    }

    #[test]
    fn popup_shows_name_and_coordinates() {
        let map = render(&position(51.50, -0.12), "TestSat", None, &MapConfig::default()).unwrap();

        let Marker::Pin { popup, .. } = &map.markers[0] else {
            panic!("first marker is not a pin");
        };
        assert_eq!(popup, "TestSat<br>Lat: 51.50°, Lon: -0.12°");
        assert!(map.to_html().contains("Lat: 51.50°, Lon: -0.12°"));
    }

    #[test]
    fn map_is_centered_with_pin_and_circle() {
        let map = render(&position(51.50, -0.12), "TestSat", None, &MapConfig::default()).unwrap();

        assert_eq!(map.center, [51.50, -0.12]);
        assert_eq!(map.zoom, 4);
        assert_eq!(map.markers.len(), 2);
        assert!(matches!(
            map.markers[0],
            Marker::Pin {
                color: Color::Red,
                icon: "info-sign",
                ..
            }
        ));
        assert!(matches!(
            &map.markers[1],
            Marker::Circle { radius: 10, color: Color::Crimson, fill: true, popup, .. } if popup == "TestSat"
        ));

        let html = map.to_html();
        assert!(html.contains(r#"L.map("map", { center: [51.5, -0.12], zoom: 4 })"#));
        assert!(html.contains(r#"markerColor: "red""#));
        assert!(html.contains(r#"radius: 10, color: "crimson", fill: true, fillColor: "crimson""#));
    }

    #[test]
    fn document_has_one_line_per_marker() {
        let map = render(&position(51.50, -0.12), "TestSat", None, &MapConfig::default()).unwrap();
        let html = map.to_html();

        let marker_lines: Vec<&str> = html
            .lines()
            .filter(|line| line.contains(".addTo(map);") && line.contains("bindPopup"))
            .collect();
        assert_eq!(marker_lines.len(), 2);
        assert!(marker_lines[0].trim_start().starts_with("L.marker([51.5, -0.12]"));
        assert!(marker_lines[1].trim_start().starts_with("L.circleMarker([51.5, -0.12]"));
        assert!(html.starts_with("<!DOCTYPE html>\n"));
        assert!(html.ends_with("    </script>\n</body>\n</html>\n"));
    }

    #[test]
    fn popup_carries_nearest_place() {
        let map = render(
            &position(51.50, -0.12),
            "TestSat",
            Some("London, United Kingdom"),
            &MapConfig { zoom: 6 },
        )
        .unwrap();

        let Marker::Pin { popup, .. } = &map.markers[0] else {
            panic!("first marker is not a pin");
        };
        assert!(popup.ends_with("<br>Near: London, United Kingdom"));
        assert_eq!(map.zoom, 6);
    }

    #[test]
    fn names_are_escaped() {
        let map = render(&position(0.0, 0.0), "</script><b>&", None, &MapConfig::default()).unwrap();
        let html = map.to_html();

        assert!(!html.contains("</script><b>"));
        assert!(html.contains("&lt;/script&gt;&lt;b&gt;&amp;"));
        assert_eq!(html.matches("</script>").count(), 3);
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let config = MapConfig::default();
        assert!(matches!(
            render(&position(91.0, 0.0), "X", None, &config),
            Err(RenderError::InvalidCoordinate { .. })
        ));
        assert!(render(&position(0.0, f64::NAN), "X", None, &config).is_err());
    }

    #[test]
    fn save_overwrites_previous_map() {
        let dir = tempfile::tempdir().unwrap();
        let config = MapConfig::default();

        let first = render(&position(10.0, 20.0), "TestSat", None, &config).unwrap();
        let path = first.save(dir.path(), 25544).unwrap();
        assert_eq!(path, dir.path().join("25544_location_map.html"));

        let second = render(&position(-30.0, 40.0), "TestSat", None, &config).unwrap();
        assert_eq!(second.save(dir.path(), 25544).unwrap(), path);

        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains("Lat: -30.00°, Lon: 40.00°"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let map = render(&position(0.0, 0.0), "X", None, &MapConfig::default()).unwrap();

        let result = map.save(&dir.path().join("missing"), 1);
        assert!(matches!(result, Err(RenderError::Io { .. })));
    }
}
