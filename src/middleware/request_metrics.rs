//! Per-request metrics log line: request id, client address, method, URI,
//! status and elapsed time.

use actix_web::{
    Error,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::{HeaderName, HeaderValue},
    middleware::Next,
};
use log::info;
use std::time::Instant;
use uuid::Uuid;

/// Response header echoing the id used in the metrics log.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Log one `METRICS` line per request after the response is produced.
///
/// The client address honours `Forwarded` and `X-Forwarded-For` before
/// falling back to the peer address.
pub async fn request_metrics(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let request_id = Uuid::new_v4().to_string();
    let started = Instant::now();
    let client_ip = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("-")
        .to_string();
    let method = req.method().clone();
    let uri = req.uri().clone();

    let mut res = next.call(req).await?;

    info!(
        "METRICS {}\t{}\t{}\t{}\t{}\t{:?}",
        request_id,
        client_ip,
        method,
        uri,
        res.status().as_u16(),
        started.elapsed()
    );

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    Ok(res)
}
