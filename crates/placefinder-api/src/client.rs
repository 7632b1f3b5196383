use reqwest::{Client, RequestBuilder, StatusCode, Url, header::HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::{
    ApiError, ClientConfig, GeoLocation, Place, PlaceDetail, PlacesApi, Result,
    SEARCH_RADIUS_METERS,
    wire::{RawGeoname, RawPlace, RawPlaceDetail, places_from_raw},
};

const API_KEY_HEADER: &str = "X-RapidAPI-Key";
const API_HOST_HEADER: &str = "X-RapidAPI-Host";

/// [`PlacesApi`] implementation for OpenTripMap served through RapidAPI.
///
/// One attempt per call, bounded by [`ClientConfig::timeout`]. Transport failures are
/// returned as [`ApiError::Network`] or [`ApiError::Timeout`].
#[derive(Debug, Clone)]
pub struct OpenTripMapClient {
    client: Client,
    config: ClientConfig,
    base_url: Url,
}

impl OpenTripMapClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        HeaderValue::from_str(&config.api_key)
            .map_err(|_| ApiError::Config("API key is not a valid header value".to_string()))?;
        HeaderValue::from_str(&config.api_host)
            .map_err(|_| ApiError::Config("API host is not a valid header value".to_string()))?;

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::Config(format!("Invalid base URL '{}': {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Config(format!(
                "Base URL '{}' cannot carry a path",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, url: Url) -> RequestBuilder {
        self.client
            .get(url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .header(API_HOST_HEADER, &self.config.api_host)
    }

    pub(crate) fn geoname_request(&self, name: &str) -> RequestBuilder {
        self.request(self.endpoint(&["places", "geoname"]))
            .query(&[("name", name)])
    }

    pub(crate) fn radius_request(&self, lat: f64, lon: f64) -> RequestBuilder {
        self.request(self.endpoint(&["places", "radius"])).query(&[
            ("radius", SEARCH_RADIUS_METERS.to_string()),
            ("lon", lon.to_string()),
            ("lat", lat.to_string()),
            ("limit", self.config.limit.to_string()),
            ("rate", self.config.min_rating.to_string()),
            ("format", "json".to_string()),
        ])
    }

    pub(crate) fn detail_request(&self, id: &str) -> RequestBuilder {
        self.request(self.endpoint(&["places", "xid", id]))
    }

    fn transport_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.config.timeout)
        } else {
            err.into()
        }
    }

    /// Send `request` and decode the JSON body. A 404 becomes `NotFound(subject)`.
    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder, subject: &str) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(subject.to_string()));
        }
        let response = response
            .error_for_status()
            .map_err(|e| self.transport_error(e))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;
        debug!(%status, bytes = body.len(), "Received response");
        Ok(serde_json::from_slice(&body)?)
    }
}

impl PlacesApi for OpenTripMapClient {
    #[instrument(name = "Geocode", skip(self), level = "info")]
    async fn geocode(&self, name: &str) -> Result<GeoLocation> {
        let raw: RawGeoname = self.fetch(self.geoname_request(name), name).await?;
        raw.into_location(name)
    }

    #[instrument(name = "Find nearby places", skip(self), level = "info")]
    async fn find_nearby(&self, lat: f64, lon: f64) -> Result<Vec<Place>> {
        let raw: Vec<RawPlace> = self
            .fetch(self.radius_request(lat, lon), &format!("{lat},{lon}"))
            .await?;
        let places = places_from_raw(raw);
        debug!(count = places.len(), "Fetched nearby places");
        Ok(places)
    }

    #[instrument(name = "Get place detail", skip(self), level = "info")]
    async fn get_detail(&self, id: &str) -> Result<PlaceDetail> {
        let raw: RawPlaceDetail = self.fetch(self.detail_request(id), id).await?;
        raw.into_detail(id)
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::Duration};

    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        sync::oneshot,
    };

    use super::*;

    fn client_for(base_url: &str) -> OpenTripMapClient {
        let config = ClientConfig::builder("test-key")
            .base_url(base_url)
            .timeout(Duration::from_millis(500))
            .build()
            .unwrap();
        OpenTripMapClient::new(config).unwrap()
    }

    fn default_client() -> OpenTripMapClient {
        OpenTripMapClient::new(ClientConfig::builder("test-key").build().unwrap()).unwrap()
    }

    fn query_pairs(url: &Url) -> HashMap<String, String> {
        url.query_pairs().into_owned().collect()
    }

    /// Accept one connection, capture the raw request and answer with `status`/`body`.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap_or(0);
            let _ = tx.send(String::from_utf8_lossy(&buf[..n]).into_owned());
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
        (format!("http://{addr}/en"), rx)
    }

    #[test]
    fn test_geoname_request_shape() {
        let request = default_client().geoname_request("Alicante").build().unwrap();

        assert_eq!(request.url().path(), "/en/places/geoname");
        assert_eq!(query_pairs(request.url())["name"], "Alicante");
        assert_eq!(request.headers()[API_KEY_HEADER], "test-key");
        assert_eq!(
            request.headers()[API_HOST_HEADER],
            "opentripmap-places-v1.p.rapidapi.com"
        );
    }

    #[test]
    fn test_radius_request_shape() {
        let request = default_client()
            .radius_request(38.34, -0.48)
            .build()
            .unwrap();
        let params = query_pairs(request.url());

        assert_eq!(request.url().path(), "/en/places/radius");
        assert_eq!(params["radius"], "10000");
        assert_eq!(params["lat"], "38.34");
        assert_eq!(params["lon"], "-0.48");
        assert_eq!(params["limit"], "50");
        assert_eq!(params["rate"], "2");
        assert_eq!(params["format"], "json");
    }

    #[test]
    fn test_detail_request_escapes_id() {
        let request = default_client().detail_request("N 1/2").build().unwrap();
        assert_eq!(request.url().path(), "/en/places/xid/N%201%2F2");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ClientConfig::builder("key").base_url("not a url").build().unwrap();
        assert!(matches!(
            OpenTripMapClient::new(config),
            Err(ApiError::Config(_))
        ));

        let config = ClientConfig::builder("bad\nkey").build().unwrap();
        assert!(matches!(
            OpenTripMapClient::new(config),
            Err(ApiError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_geocode_over_http() {
        let (base_url, request) = serve_once(
            "200 OK",
            r#"{"name":"Alicante","country":"ES","lat":38.34,"lon":-0.48,"status":"OK"}"#,
        )
        .await;

        let location = client_for(&base_url).geocode("Alicante").await.unwrap();
        assert_eq!(location.name, "Alicante");
        assert_eq!(location.country, "ES");

        let request = request.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /en/places/geoname?name=alicante"));
        assert!(request.contains("x-rapidapi-key: test-key"));
    }

    #[tokio::test]
    async fn test_geocode_zero_coordinates_is_not_found() {
        let (base_url, _request) = serve_once("200 OK", r#"{"lat":0,"lon":-0.48}"#).await;
        let err = client_for(&base_url).geocode("Unknown").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_detail_404_is_not_found() {
        let (base_url, _request) = serve_once("404 Not Found", r#"{"error":"Not found"}"#).await;
        let err = client_for(&base_url).get_detail("zzz").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(ref id) if id == "zzz"));
    }

    #[tokio::test]
    async fn test_server_error_is_network() {
        let (base_url, _request) = serve_once("500 Internal Server Error", "{}").await;
        let err = client_for(&base_url).find_nearby(1.0, 1.0).await.unwrap_err();
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_nearby_drops_unusable_entries() {
        let (base_url, _request) = serve_once(
            "200 OK",
            r#"[{"xid":"N1","name":"Castle","rate":3,"kinds":"historic","point":{"lon":-0.47,"lat":38.36}},{"xid":"","name":"Ghost"},{"xid":"N3","name":"Far","point":{"lon":200,"lat":38.36}}]"#,
        )
        .await;

        let places = client_for(&base_url).find_nearby(38.34, -0.48).await.unwrap();
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].id, "N1");
    }

    #[tokio::test]
    async fn test_nearby_non_array_body_is_error() {
        let (base_url, _request) = serve_once("200 OK", r#"{"error":"bad"}"#).await;
        let err = client_for(&base_url).find_nearby(1.0, 1.0).await.unwrap_err();
        assert!(matches!(err, ApiError::Serde(_)));
    }

    #[tokio::test]
    async fn test_unresponsive_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let err = client_for(&format!("http://{addr}/en"))
            .geocode("Anywhere")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Timeout(_)));
        assert!(err.is_network());
    }
}
