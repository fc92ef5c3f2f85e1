//! Sharing locations and map positions
//!
//! Builds `geo:` URIs (RFC 5870) for handing a location to a maps app, plain
//! share text, and `ddrfinder://map` deep links that reopen the viewer at a
//! given position.

use thiserror::Error;
use url::form_urlencoded::byte_serialize;
use url::Url;

use crate::data::{LatLng, LocationRecord, SourceRecord};

/// Scheme of map deep links
pub const MAP_LINK_SCHEME: &str = "ddrfinder";

/// Span used when a map link does not carry one
pub const DEFAULT_LINK_SPAN: f64 = 0.5;

/// Errors that can occur when parsing a map link
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LinkError {
    #[error("malformed link: {0}")]
    Malformed(String),

    #[error("not a ddrfinder map link")]
    NotMapLink,

    #[error("missing or invalid parameter '{0}'")]
    Parameter(&'static str),

    #[error("coordinates out of range")]
    OutOfRange,
}

/// Map position carried by a deep link
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center: LatLng,
    /// Span in degrees of both sides of the viewed box
    pub span: f64,
}

/// Builds a `geo:` URI that drops a labelled pin on the location
pub fn geo_uri(location: &LocationRecord) -> String {
    let label: String = byte_serialize(location.name.as_bytes()).collect();
    format!(
        "geo:{lat},{lng}?q={lat},{lng}({label})",
        lat = location.lat,
        lng = location.lng,
        label = label.replace('+', "%20")
    )
}

/// Human readable text for sharing a location
pub fn share_text(location: &LocationRecord, source: Option<&SourceRecord>) -> String {
    let link = source
        .and_then(|s| s.info_url_for(location))
        .unwrap_or_else(|| geo_uri(location));

    if location.city.is_empty() {
        format!("{}\n{}", location.name, link)
    } else {
        format!("{}\n{}\n{}", location.name, location.city, link)
    }
}

/// Builds a deep link reopening the map at `center`
pub fn map_link(center: LatLng, span: f64) -> String {
    format!(
        "{}://map?lat={}&lng={}&span={}",
        MAP_LINK_SCHEME, center.lat, center.lng, span
    )
}

/// Parses a deep link produced by [`map_link`]
pub fn parse_map_link(link: &str) -> Result<MapView, LinkError> {
    let url = Url::parse(link).map_err(|e| LinkError::Malformed(e.to_string()))?;
    if url.scheme() != MAP_LINK_SCHEME || url.host_str() != Some("map") {
        return Err(LinkError::NotMapLink);
    }

    let mut lat = None;
    let mut lng = None;
    let mut span = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "lat" => lat = Some(value.parse::<f64>().map_err(|_| LinkError::Parameter("lat"))?),
            "lng" => lng = Some(value.parse::<f64>().map_err(|_| LinkError::Parameter("lng"))?),
            "span" => {
                span = Some(value.parse::<f64>().map_err(|_| LinkError::Parameter("span"))?)
            }
            _ => {}
        }
    }

    let center = LatLng::new(
        lat.ok_or(LinkError::Parameter("lat"))?,
        lng.ok_or(LinkError::Parameter("lng"))?,
    );
    if !center.is_valid() {
        return Err(LinkError::OutOfRange);
    }

    let span = span.unwrap_or(DEFAULT_LINK_SPAN);
    if !(span > 0.0 && span <= 180.0) {
        return Err(LinkError::Parameter("span"));
    }

    Ok(MapView { center, span })
}
