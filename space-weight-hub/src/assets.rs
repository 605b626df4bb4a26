//! Static front-end files

use std::path::{Component, Path, PathBuf};

use crate::http::HttpResult;

/// `GET /`
pub async fn index(static_dir: &Path) -> HttpResult {
    match tokio::fs::read(static_dir.join("index.html")).await {
        Ok(bytes) => file_response(bytes, "index.html"),
        Err(_) => space_weight_hub::server_error!("index.html not found in static/"),
    }
}

/// `GET /favicon.ico`
pub async fn favicon(static_dir: &Path) -> HttpResult {
    match tokio::fs::read(static_dir.join("favicon.ico")).await {
        Ok(bytes) => file_response(bytes, "favicon.ico"),
        Err(_) => space_weight_hub::not_found!("No favicon"),
    }
}

/// `GET /static/<path>`
pub async fn serve(static_dir: &Path, path: &str) -> HttpResult {
    let Some(file) = resolve(static_dir, path) else {
        return space_weight_hub::not_found!("not found: /static/{path}");
    };

    match tokio::fs::read(&file).await {
        Ok(bytes) => file_response(bytes, path),
        Err(e) => {
            log::debug!("failed to read {}: {e}", file.display());
            space_weight_hub::not_found!("not found: /static/{path}")
        }
    }
}

/// Only plain relative paths below `static_dir` are served.
fn resolve(static_dir: &Path, path: &str) -> Option<PathBuf> {
    let relative = Path::new(path);
    if path.is_empty() || !relative.components().all(|c| matches!(c, Component::Normal(_))) {
        return None;
    }
    Some(static_dir.join(relative))
}

fn file_response(bytes: Vec<u8>, name: &str) -> HttpResult {
    space_weight_hub::http::with_content_type(
        space_weight_hub::http::bytes_to_resp(bytes, hyper::StatusCode::OK),
        content_type(name),
    )
}

fn content_type(name: &str) -> &'static str {
    let ext = name.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_escaping_paths() {
        let dir = Path::new("static");
        assert_eq!(resolve(dir, "app.js"), Some(PathBuf::from("static/app.js")));
        assert_eq!(resolve(dir, "img/moon.png"), Some(PathBuf::from("static/img/moon.png")));
        assert_eq!(resolve(dir, "../Cargo.toml"), None);
        assert_eq!(resolve(dir, "img/../../secret"), None);
        assert_eq!(resolve(dir, "/etc/passwd"), None);
        assert_eq!(resolve(dir, "./app.js"), None);
        assert_eq!(resolve(dir, ""), None);
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type("index.html"), "text/html; charset=utf-8");
        assert_eq!(content_type("app.JS"), "text/javascript; charset=utf-8");
        assert_eq!(content_type("LICENSE"), "application/octet-stream");
    }
}
