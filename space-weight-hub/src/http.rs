use std::sync::Arc;

use space_weight_scale::ScaleTransport;

use crate::AppState;

pub type HttpResult<E = std::io::Error> = Result<HttpResponse, E>;

pub type HttpResponse =
    hyper::Response<http_body_util::combinators::BoxBody<hyper::body::Bytes, std::io::Error>>;

pub async fn run_server<T>(addr: &str, state: Arc<AppState<T>>) -> std::io::Result<()>
where
    T: ScaleTransport + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("listening on http://{addr}");
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                log::debug!("connection from {peer}");
                tokio::task::spawn(handle_connection(stream, state.clone()));
            }
            Err(e) => {
                log::error!("failed to accept: {e:?}");
                continue;
            }
        }
    }
}

async fn handle_connection<T>(stream: tokio::net::TcpStream, state: Arc<AppState<T>>)
where
    T: ScaleTransport + 'static,
{
    let io = hyper_util::rt::TokioIo::new(stream);

    // http1.1 that upgrades to http2 if the client asks for it
    let builder =
        hyper_util::server::conn::auto::Builder::new(hyper_util::rt::tokio::TokioExecutor::new());
    let conn = builder.serve_connection(
        io,
        hyper::service::service_fn(|r| handle_request(r, state.clone())),
    );

    if let Err(e) = conn.await {
        log::warn!("connection error: {e:?}");
    }
}

pub async fn handle_request<B, T>(r: hyper::Request<B>, state: Arc<AppState<T>>) -> HttpResult
where
    B: hyper::body::Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    T: ScaleTransport,
{
    let method = r.method().clone();
    let path = r.uri().path().to_string();
    let query = r.uri().query().map(str::to_string);
    log::debug!("{method} {path}");

    match (method, path.as_str()) {
        (hyper::Method::POST, "/set_weight_from_phone") => {
            space_weight_hub::weight::set_weight_from_phone(r, &state.arbiter).await
        }
        (hyper::Method::GET, "/get_weight") => {
            space_weight_hub::weight::get_weight(query.as_deref(), &state.arbiter).await
        }
        (hyper::Method::GET, "/read_scale") => {
            space_weight_hub::weight::read_scale(state.scale.as_ref()).await
        }
        (hyper::Method::GET, "/") => space_weight_hub::assets::index(&state.static_dir).await,
        (hyper::Method::GET, "/favicon.ico") => {
            space_weight_hub::assets::favicon(&state.static_dir).await
        }
        (hyper::Method::GET, t) if t.starts_with("/static/") => {
            space_weight_hub::assets::serve(&state.static_dir, &t["/static/".len()..]).await
        }
        (_, t) => space_weight_hub::not_found!("not found: {t}"),
    }
}

pub fn json<T: serde::Serialize>(o: T) -> HttpResult {
    let bytes = match serde_json::to_vec(&o) {
        Ok(v) => v,
        Err(e) => return server_error_(format!("failed to serialize json: {e:?}")),
    };
    with_content_type(bytes_to_resp(bytes, hyper::StatusCode::OK), "application/json")
}

pub fn with_content_type(r: HttpResult, content_type: &'static str) -> HttpResult {
    let mut r = r?;
    r.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static(content_type),
    );
    Ok(r)
}

pub fn server_error_(s: String) -> HttpResult {
    bytes_to_resp(s.into_bytes(), hyper::StatusCode::INTERNAL_SERVER_ERROR)
}

pub fn bytes_to_resp(bytes: Vec<u8>, status: hyper::StatusCode) -> HttpResult {
    use http_body_util::BodyExt;

    let mut r = hyper::Response::new(
        http_body_util::Full::new(hyper::body::Bytes::from(bytes))
            .map_err(|e| match e {})
            .boxed(),
    );
    *r.status_mut() = status;
    Ok(r)
}

pub fn not_found_(m: String) -> HttpResult {
    bytes_to_resp(m.into_bytes(), hyper::StatusCode::NOT_FOUND)
}

pub fn bad_request_(m: String) -> HttpResult {
    bytes_to_resp(m.into_bytes(), hyper::StatusCode::BAD_REQUEST)
}

pub fn service_unavailable_(m: String) -> HttpResult {
    bytes_to_resp(m.into_bytes(), hyper::StatusCode::SERVICE_UNAVAILABLE)
}

#[macro_export]
macro_rules! server_error {
    ($($t:tt)*) => {{
        space_weight_hub::http::server_error_(format!($($t)*))
    }};
}

#[macro_export]
macro_rules! not_found {
    ($($t:tt)*) => {{
        space_weight_hub::http::not_found_(format!($($t)*))
    }};
}

#[macro_export]
macro_rules! bad_request {
    ($($t:tt)*) => {{
        space_weight_hub::http::bad_request_(format!($($t)*))
    }};
}

#[macro_export]
macro_rules! service_unavailable {
    ($($t:tt)*) => {{
        space_weight_hub::http::service_unavailable_(format!($($t)*))
    }};
}
