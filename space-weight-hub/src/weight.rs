use space_weight_proto::{PushRequest, StatusResponse, WeightResponse, WeightSource};
use space_weight_scale::{ScaleReader, ScaleTransport};

use crate::WeightArbiter;
use crate::http::HttpResult;

/// Largest push body accepted, the expected one is well under 100 bytes
pub const MAX_PUSH_BODY: usize = 16 * 1024;

/// `POST /set_weight_from_phone`, called by the companion app with
/// `{"name": "ScaleStation1", "weight_kg": 63.4}`. `name` is optional.
pub async fn set_weight_from_phone<B>(
    r: hyper::Request<B>,
    arbiter: &WeightArbiter,
) -> HttpResult
where
    B: hyper::body::Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let limited = http_body_util::Limited::new(r.into_body(), MAX_PUSH_BODY);
    let body = match http_body_util::BodyExt::collect(limited).await {
        Ok(body) => body.to_bytes(),
        Err(e) => return space_weight_hub::bad_request!("failed to read body: {e}"),
    };

    let push = match serde_json::from_slice::<PushRequest>(&body) {
        Ok(push) => push,
        Err(e) => return space_weight_hub::bad_request!("invalid JSON body: {e}"),
    };

    let weight_kg = match arbiter.record_push(&push).await {
        Ok(w) => w,
        Err(e) => return space_weight_hub::bad_request!("{e}"),
    };

    let from = push
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("phone-client");
    log::info!("[PHONE] received weight from {from}: {weight_kg:.2} kg");

    space_weight_hub::http::json(StatusResponse::ok())
}

/// `GET /get_weight?weight=<kg>`
///
/// A phone weight younger than the freshness window wins, then `?weight=`,
/// otherwise 400.
pub async fn get_weight(query: Option<&str>, arbiter: &WeightArbiter) -> HttpResult {
    let explicit = query_param(query, "weight");

    match arbiter.resolve(explicit.as_deref()).await {
        Ok(resolution) => space_weight_hub::http::json(resolution.into_response()),
        Err(e) => space_weight_hub::bad_request!("{e}"),
    }
}

/// `GET /read_scale`, reads the BLE scale directly.
pub async fn read_scale<T: ScaleTransport>(scale: Option<&ScaleReader<T>>) -> HttpResult {
    let Some(reader) = scale else {
        return space_weight_hub::service_unavailable!("no scale reader is configured");
    };

    match reader.get_weight().await {
        Ok(kg) => space_weight_hub::http::json(WeightResponse::new(WeightSource::Scale, kg, None)),
        Err(e) => space_weight_hub::service_unavailable!("{e}"),
    }
}

/// Last value of `key` in a query string, decoded, `None` when absent or empty.
fn query_param(query: Option<&str>, key: &str) -> Option<String> {
    query?
        .split('&')
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .filter(|(k, _)| decode_component(k) == key)
        .map(|(_, v)| decode_component(v))
        .last()
        .filter(|v| !v.is_empty())
}

/// `application/x-www-form-urlencoded` decoding: `+` is a space and `%XX` a
/// byte. Malformed escapes are kept as they are.
fn decode_component(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => match bytes.get(i + 1..i + 3).and_then(hex_byte) {
                Some(b) => {
                    out.push(b);
                    i += 2;
                }
                None => out.push(b'%'),
            },
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_byte(pair: &[u8]) -> Option<u8> {
    if !pair.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    let hex = std::str::from_utf8(pair).ok()?;
    u8::from_str_radix(hex, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::{decode_component, query_param};

    #[test]
    fn query_param_lookup() {
        let q = |s| query_param(Some(s), "weight");
        assert_eq!(q("weight=82").as_deref(), Some("82"));
        assert_eq!(q("a=1&weight=70.5&b").as_deref(), Some("70.5"));
        assert_eq!(q("weight=1&weight=2").as_deref(), Some("2"));
        assert_eq!(q("weight="), None);
        assert_eq!(q("weight"), None);
        assert_eq!(q("weights=3"), None);
        assert_eq!(query_param(None, "weight"), None);
    }

    #[test]
    fn query_param_is_decoded() {
        let q = |s| query_param(Some(s), "weight");
        assert_eq!(q("weight=70%2E5").as_deref(), Some("70.5"));
        assert_eq!(q("w%65ight=64").as_deref(), Some("64"));
        assert_eq!(q("weight=+82+").as_deref(), Some(" 82 "));
    }

    #[test]
    fn malformed_escapes_are_kept() {
        assert_eq!(decode_component("70%"), "70%");
        assert_eq!(decode_component("%zz1"), "%zz1");
        assert_eq!(decode_component("%4"), "%4");
        assert_eq!(decode_component("%+4"), "% 4");
        assert_eq!(decode_component("%41%42"), "AB");
        assert_eq!(decode_component("caf%C3%A9"), "café");
    }
}
