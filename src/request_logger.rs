use rocket::fairing::{Fairing, Info, Kind};
use rocket::{Data, Request, Response};
use std::time::Instant;

/// Fairing to log one line per HTTP request with timing.
///
/// Health probes are logged at debug so load balancers do not flood the log.
pub struct RequestLogger;

fn is_probe(path: &str) -> bool {
    path.ends_with("/health") || path.ends_with("/health/ready")
}

#[rocket::async_trait]
impl Fairing for RequestLogger {
    fn info(&self) -> Info {
        Info {
            name: "Request Logger",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        request.local_cache(Instant::now);
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let start_time = request.local_cache(Instant::now);
        let elapsed_ms = start_time.elapsed().as_secs_f64() * 1000.0;

        let method = request.method();
        // Unsubscribe paths carry an address; log the route, not the value.
        let path = match request.route().map(|route| route.uri.to_string()) {
            Some(template) if template.contains('<') => template,
            _ => request.uri().path().to_string(),
        };
        let status = response.status().code;

        if is_probe(&path) {
            log::debug!("{} {} -> {} ({:.2}ms)", method, path, status, elapsed_ms);
        } else {
            log::info!("{} {} -> {} ({:.2}ms)", method, path, status, elapsed_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::is_probe;

    #[test]
    fn only_health_paths_are_probes() {
        assert!(is_probe("/api/v1/health"));
        assert!(is_probe("/api/v1/health/ready"));
        assert!(!is_probe("/api/v1/recipients"));
    }
}
