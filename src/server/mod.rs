//! HTTP front end
//!
//! Thin routing and wire projection around the pipeline: GET/HEAD only,
//! direction picked from the `Accept` header, and a typed error mapper
//! at the top.

use crate::cache::CacheStore;
use crate::config::Config;
use crate::convert::{Converter, Direction, Toolchain};
use crate::error::{WebpxError, WebpxResult};
use crate::pipeline::{ImageResponse, Pipeline, CACHE_KEY_HEADER, STATS_HEADER};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Assemble the pipeline from configuration
pub fn build_pipeline(config: &Config) -> Pipeline {
    let toolchain = Toolchain::new(config.paths.bin_dir.clone());
    let converter = Converter::new(toolchain, config.convert.quality, config.convert.timeout());
    let store = CacheStore::new(config.paths.cache_dir.clone());
    Pipeline::new(config.paths.document_root.clone(), store, converter)
}

/// Run the proxy until ctrl-c
pub async fn run(config: &Config) -> WebpxResult<()> {
    let pipeline = Arc::new(build_pipeline(config));

    let missing = pipeline.converter().toolchain().missing();
    if !missing.is_empty() {
        warn!(
            "Missing conversion tools for {}: {}; affected requests will serve originals",
            pipeline.converter().toolchain().platform(),
            missing
                .iter()
                .map(|t| t.name())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    let addr = config.server.listen_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| WebpxError::io(format!("binding {}", addr), e))?;
    info!("Listening on http://{}", addr);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
            accepted = listener.accept() => {
                let (stream, peer) = accepted
                    .map_err(|e| WebpxError::io("accepting connection", e))?;
                let pipeline = pipeline.clone();

                tokio::spawn(async move {
                    let io = TokioIo::new(stream);
                    let service = service_fn(move |req: Request<Incoming>| {
                        let pipeline = pipeline.clone();
                        async move {
                            let method = req.method().clone();
                            let path = req.uri().path().to_string();
                            let accept = req
                                .headers()
                                .get(ACCEPT)
                                .and_then(|v| v.to_str().ok())
                                .unwrap_or("")
                                .to_string();
                            Ok::<_, Infallible>(
                                respond(&pipeline, &method, &path, &accept).await,
                            )
                        }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        debug!("Connection error from {}: {:?}", peer, err);
                    }
                });
            }
        }
    }

    Ok(())
}

/// Which pipeline a request goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Compress,
    Decompress,
    Static,
}

/// WebP-capable agents get legacy images compressed, incapable agents
/// get `.webp` paths decompressed, everything else passes through
/// untouched.
fn route(path: &str, accepts_webp: bool) -> Route {
    let lower = path.to_ascii_lowercase();
    let legacy = [".jpg", ".jpeg", ".png", ".gif"]
        .iter()
        .any(|ext| lower.ends_with(ext));
    let webp = lower.ends_with(".webp");

    if accepts_webp && legacy {
        Route::Compress
    } else if !accepts_webp && webp {
        Route::Decompress
    } else {
        Route::Static
    }
}

/// Handle one request end to end, never failing at the wire level
async fn respond(
    pipeline: &Pipeline,
    method: &Method,
    path: &str,
    accept: &str,
) -> Response<Full<Bytes>> {
    let head = match *method {
        Method::GET => false,
        Method::HEAD => true,
        _ => return empty_response(StatusCode::METHOD_NOT_ALLOWED),
    };

    let accepts_webp = accept.contains("image/webp");
    let result = match route(path, accepts_webp) {
        Route::Compress => pipeline.handle(Direction::Compress, path, head).await,
        Route::Decompress => pipeline.handle(Direction::Decompress, path, head).await,
        Route::Static => pipeline.passthrough(path, head).await,
    };

    match result {
        Ok(image) => emit(image),
        Err(err) => map_error(err),
    }
}

/// ResponseEmitter: pure projection of pipeline state onto the wire
fn emit(image: ImageResponse) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, image.content_type.as_str())
        .header(CONTENT_LENGTH, image.content_length);

    if let Some(key) = &image.cache_key {
        builder = builder.header(CACHE_KEY_HEADER, key.as_str());
    }
    if let Some(stats) = &image.stats {
        builder = builder.header(STATS_HEADER, stats.as_str());
    }

    builder
        .body(Full::new(image.body.unwrap_or_default()))
        .unwrap_or_else(|_| empty_response(StatusCode::INTERNAL_SERVER_ERROR))
}

/// ErrorMapper: resolution failures become bare statuses, anything
/// unexpected becomes a 500 with a plain-text diagnostic
fn map_error(err: WebpxError) -> Response<Full<Bytes>> {
    match err.http_status() {
        404 => empty_response(StatusCode::NOT_FOUND),
        403 => empty_response(StatusCode::FORBIDDEN),
        _ => {
            error!("Request failed: {}", err);
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header(CONTENT_TYPE, "text/plain")
                .body(Full::new(Bytes::from(err.to_string())))
                .unwrap_or_else(|_| empty_response(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}

fn empty_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn routing_follows_accept_and_extension() {
        assert_eq!(route("/a.jpg", true), Route::Compress);
        assert_eq!(route("/a.JPEG", true), Route::Compress);
        assert_eq!(route("/a.png", true), Route::Compress);
        assert_eq!(route("/a.gif", true), Route::Compress);
        assert_eq!(route("/a.webp", false), Route::Decompress);
        assert_eq!(route("/a.WEBP", false), Route::Decompress);

        // Capable agent fetching webp directly, and incapable agent
        // fetching legacy images, both pass through
        assert_eq!(route("/a.webp", true), Route::Static);
        assert_eq!(route("/a.jpg", false), Route::Static);
        assert_eq!(route("/style.css", true), Route::Static);
    }

    #[test]
    fn emit_sets_diagnostic_headers() {
        let response = emit(ImageResponse {
            content_type: "image/webp".to_string(),
            content_length: 4,
            cache_key: Some("abc123".to_string()),
            stats: Some("status=success; original=1.0kb; ratio=50.00%;".to_string()),
            body: Some(Bytes::from_static(b"RIFF")),
        });

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "image/webp");
        assert_eq!(response.headers()[CONTENT_LENGTH], "4");
        assert_eq!(response.headers()["X-Cache-Key"], "abc123");
        assert!(response.headers()["X-PHPWebP-Stats"]
            .to_str()
            .unwrap()
            .starts_with("status=success;"));
    }

    #[test]
    fn emit_omits_absent_headers() {
        let response = emit(ImageResponse {
            content_type: "image/jpeg".to_string(),
            content_length: 2,
            cache_key: None,
            stats: Some("status=failure;".to_string()),
            body: None,
        });

        assert!(response.headers().get("X-Cache-Key").is_none());
        assert_eq!(response.headers()["X-PHPWebP-Stats"], "status=failure;");
    }

    #[test]
    fn error_mapping_statuses() {
        let response = map_error(WebpxError::NotFound(PathBuf::from("/a")));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(CONTENT_TYPE).is_none());

        let response = map_error(WebpxError::Forbidden(PathBuf::from("/a")));
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = map_error(WebpxError::Internal("boom".to_string()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
    }
}
