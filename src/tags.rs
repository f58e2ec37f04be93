use http::header::HeaderName;
use http::{HeaderMap, Request};
use opentelemetry::{Key, KeyValue};
use opentelemetry_semantic_conventions::attribute::{
    HTTP_REQUEST_METHOD, NETWORK_PEER_ADDRESS, NETWORK_PEER_PORT, URL_FULL,
};

/// Maps recognized request headers to span attributes.
///
/// Services often carry domain identifiers (tenant ids, device ids, API
/// versions) in well-known headers; a `HeaderTagMap` records those on every
/// span a [`RequestTracer`](crate::RequestTracer) creates. Headers absent
/// from a request are skipped, as are values that are not valid ASCII.
///
/// ```
/// use http::header::HeaderName;
/// use reqtrace::HeaderTagMap;
///
/// let tags = HeaderTagMap::new()
///     .map(HeaderName::from_static("x-tenant-id"), "tenant.id")
///     .map(HeaderName::from_static("x-api-version"), "api.version");
/// ```
#[derive(Clone, Debug, Default)]
pub struct HeaderTagMap {
    entries: Vec<(HeaderName, Key)>,
}

impl HeaderTagMap {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the value of `header` under the attribute key `tag`.
    pub fn map(mut self, header: HeaderName, tag: impl Into<Key>) -> Self {
        self.entries.push((header, tag.into()));
        self
    }

    pub(crate) fn apply(&self, headers: &HeaderMap, attributes: &mut Vec<KeyValue>) {
        for (header, tag) in &self.entries {
            if let Some(value) = headers.get(header).and_then(|value| value.to_str().ok()) {
                attributes.push(KeyValue::new(tag.clone(), value.to_owned()));
            }
        }
    }
}

/// Standard attributes attached by every span creation path: HTTP method,
/// full URL, and the peer host/port when the URI carries an authority.
///
/// The peer port is recorded exactly when the authority contains a port;
/// `http::Uri` has already validated the digits by construction.
pub(crate) fn request_attributes<B>(
    req: &Request<B>,
    header_tags: &HeaderTagMap,
) -> Vec<KeyValue> {
    let mut attributes = vec![
        KeyValue::new(HTTP_REQUEST_METHOD, req.method().as_str().to_owned()),
        KeyValue::new(URL_FULL, req.uri().to_string()),
    ];
    if let Some(host) = req.uri().host() {
        attributes.push(KeyValue::new(NETWORK_PEER_ADDRESS, host.to_owned()));
        if let Some(port) = req.uri().port_u16() {
            attributes.push(KeyValue::new(NETWORK_PEER_PORT, i64::from(port)));
        }
    }
    header_tags.apply(req.headers(), &mut attributes);
    attributes
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::Value;

    fn request(uri: &str) -> Request<()> {
        Request::builder().method("GET").uri(uri).body(()).unwrap()
    }

    fn lookup<'a>(attributes: &'a [KeyValue], key: &str) -> Option<&'a Value> {
        attributes
            .iter()
            .find(|kv| kv.key.as_str() == key)
            .map(|kv| &kv.value)
    }

    #[test]
    fn method_and_url_always_present() {
        let attributes = request_attributes(&request("/health"), &HeaderTagMap::new());

        assert_eq!(
            lookup(&attributes, HTTP_REQUEST_METHOD),
            Some(&Value::from("GET"))
        );
        assert_eq!(lookup(&attributes, URL_FULL), Some(&Value::from("/health")));
    }

    #[test]
    fn peer_port_set_for_well_formed_authority() {
        let attributes =
            request_attributes(&request("http://example.com:8080/a"), &HeaderTagMap::new());

        assert_eq!(
            lookup(&attributes, NETWORK_PEER_ADDRESS),
            Some(&Value::from("example.com"))
        );
        assert_eq!(
            lookup(&attributes, NETWORK_PEER_PORT),
            Some(&Value::I64(8080))
        );
    }

    #[test]
    fn no_peer_port_without_port_in_authority() {
        let attributes =
            request_attributes(&request("http://example.com/a"), &HeaderTagMap::new());

        assert_eq!(
            lookup(&attributes, NETWORK_PEER_ADDRESS),
            Some(&Value::from("example.com"))
        );
        assert_eq!(lookup(&attributes, NETWORK_PEER_PORT), None);
    }

    #[test]
    fn no_peer_attributes_for_origin_form_uri() {
        let attributes = request_attributes(&request("/carts/42"), &HeaderTagMap::new());

        assert_eq!(lookup(&attributes, NETWORK_PEER_ADDRESS), None);
        assert_eq!(lookup(&attributes, NETWORK_PEER_PORT), None);
    }

    #[test]
    fn header_tags_applied_when_present() {
        let tags = HeaderTagMap::new()
            .map(HeaderName::from_static("x-tenant-id"), "tenant.id")
            .map(HeaderName::from_static("x-device-id"), "device.id");
        let mut req = request("http://example.com/a");
        req.headers_mut()
            .insert("x-tenant-id", "acme".parse().unwrap());

        let attributes = request_attributes(&req, &tags);

        assert_eq!(lookup(&attributes, "tenant.id"), Some(&Value::from("acme")));
        assert_eq!(lookup(&attributes, "device.id"), None);
    }
}
