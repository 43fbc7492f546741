use std::fs;
use std::path::Path;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{Config, EngineEnv};
use crate::error::AppError;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const IMAGE_INFO_TIMEOUT: Duration = Duration::from_secs(20);

/// The engine REST surface the pollers depend on.
pub trait EngineApi {
    /// Unauthenticated liveness check.
    fn check_health(&self) -> Result<(), AppError>;

    /// Authenticated check that the API is serving requests.
    fn check_system(&self) -> Result<(), AppError>;

    /// Current `analysis_status` of the image with the given digest.
    fn image_status(&self, digest: &str) -> Result<String, AppError>;
}

pub struct EngineClient {
    http: Client,
    health_url: String,
    system_url: String,
    config: Config,
    user: String,
    password: SecretString,
}

impl EngineClient {
    pub fn new(config: &Config, env: &EngineEnv) -> Result<Self, AppError> {
        let http = Client::builder().danger_accept_invalid_certs(!env.ssl_verify()).build()?;
        Ok(Self {
            http,
            health_url: config.health_url(),
            system_url: config.system_url(),
            config: config.clone(),
            user: env.user().to_string(),
            password: env.password(),
        })
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.user, Some(self.password.expose_secret()))
    }

    /// Download the engine's `config.yaml` to the configured location.
    pub fn download_config(&self) -> Result<(), AppError> {
        let url = &self.config.config_url;
        info!(url = url.as_str(), "Downloading engine configuration");
        let response = expect_ok(url, self.http.get(url).send()?)?;
        let body = response.bytes()?;
        write_config(&self.config.config_path, &body)
    }
}

impl EngineApi for EngineClient {
    fn check_health(&self) -> Result<(), AppError> {
        let response = self.http.get(&self.health_url).timeout(PROBE_TIMEOUT).send()?;
        expect_ok(&self.health_url, response).map(drop)
    }

    fn check_system(&self) -> Result<(), AppError> {
        let request = self.authed(self.http.get(&self.system_url)).timeout(PROBE_TIMEOUT);
        expect_ok(&self.system_url, request.send()?).map(drop)
    }

    fn image_status(&self, digest: &str) -> Result<String, AppError> {
        let url = self.config.image_url(digest);
        let request = self.authed(self.http.get(&url)).timeout(IMAGE_INFO_TIMEOUT);
        let body = expect_ok(&url, request.send()?)?.text()?;
        debug!(digest, "Fetched image info");
        parse_analysis_status(&body)
    }
}

fn expect_ok(url: &str, response: Response) -> Result<Response, AppError> {
    let status = response.status();
    if status == StatusCode::OK {
        Ok(response)
    } else {
        let body = response.text().unwrap_or_default();
        Err(AppError::HttpStatus { url: url.to_string(), status: status.as_u16(), body })
    }
}

fn write_config(path: &Path, body: &[u8]) -> Result<(), AppError> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, body)?;
    Ok(())
}

#[derive(Deserialize)]
struct ImageInfo {
    analysis_status: String,
}

/// Image info comes back as a JSON array; the first record carries the status.
pub fn parse_analysis_status(body: &str) -> Result<String, AppError> {
    let records: Vec<Value> = serde_json::from_str(body)?;
    let first = records
        .into_iter()
        .next()
        .ok_or_else(|| AppError::malformed("image info response was an empty list"))?;
    let info: ImageInfo = serde_json::from_value(first)
        .map_err(|_| AppError::malformed("image info response has no 'analysis_status' field"))?;
    Ok(info.analysis_status)
}

/// `anchore-cli --json image add` prints a JSON array; the digest of the first
/// record identifies the image from then on.
pub fn parse_image_digest(output: &str) -> Result<String, AppError> {
    let records: Vec<Value> = serde_json::from_str(output)?;
    records
        .first()
        .and_then(|record| record.get("imageDigest"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AppError::malformed("image add output has no 'imageDigest' field"))
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    use super::*;

    /// Answer a single request with `status` and `body`; yields the request head.
    fn respond(status: u16, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = String::new();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
                head.push_str(&line);
            }
            write!(
                stream,
                "HTTP/1.1 {status} Status\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            head.to_ascii_lowercase()
        });
        (url, handle)
    }

    fn client_for(url: &str) -> EngineClient {
        let config = Config { engine_url: url.to_string(), ..Config::default() };
        let env = EngineEnv::resolve(|name| match name {
            "ANCHORE_CLI_USER" => Some("ci".to_string()),
            "ANCHORE_CLI_PASS" => Some("secret".to_string()),
            _ => None,
        });
        EngineClient::new(&config, &env).unwrap()
    }

    #[test]
    fn health_check_is_unauthenticated() {
        let (url, server) = respond(200, "");

        client_for(&url).check_health().unwrap();

        let head = server.join().unwrap();
        assert!(head.starts_with("get /health http/1.1"));
        assert!(!head.contains("authorization:"));
    }

    #[test]
    fn system_check_sends_resolved_credentials() {
        let (url, server) = respond(200, "[]");

        client_for(&url).check_system().unwrap();

        let head = server.join().unwrap();
        assert!(head.starts_with("get /v1/system/feeds http/1.1"));
        // base64("ci:secret")
        assert!(head.contains("authorization: basic y2k6c2vjcmv0"));
    }

    #[test]
    fn unavailable_engine_is_an_http_status_error() {
        let (url, server) = respond(503, "starting up");

        let err = client_for(&url).check_health().unwrap_err();

        server.join().unwrap();
        match err {
            AppError::HttpStatus { status, body, url: failed } => {
                assert_eq!(status, 503);
                assert_eq!(body, "starting up");
                assert!(failed.ends_with("/health"));
            }
            other => panic!("expected an HTTP status error, got {other:?}"),
        }
    }

    #[test]
    fn image_status_reads_authenticated_image_info() {
        let (url, server) = respond(200, r#"[{"analysis_status": "analyzing"}]"#);

        let status = client_for(&url).image_status("sha256:feed").unwrap();

        assert_eq!(status, "analyzing");
        let head = server.join().unwrap();
        assert!(head.starts_with("get /v1/images/sha256:feed http/1.1"));
        assert!(head.contains("authorization: basic"));
    }

    #[test]
    fn reads_status_from_first_record() {
        let body = r#"[{"analysis_status": "analyzing", "imageDigest": "sha256:1"},
                       {"analysis_status": "analyzed"}]"#;
        assert_eq!(parse_analysis_status(body).unwrap(), "analyzing");
    }

    #[test]
    fn empty_or_incomplete_image_info_is_malformed() {
        assert!(matches!(parse_analysis_status("[]"), Err(AppError::MalformedResponse(_))));
        assert!(matches!(
            parse_analysis_status(r#"[{"status": "x"}]"#),
            Err(AppError::MalformedResponse(_))
        ));
        assert!(matches!(parse_analysis_status("not json"), Err(AppError::Json(_))));
    }

    #[test]
    fn extracts_digest_from_add_output() {
        let output = r#"[{"imageDigest": "sha256:abc", "analysis_status": "not_analyzed"}]"#;
        assert_eq!(parse_image_digest(output).unwrap(), "sha256:abc");
        assert!(matches!(parse_image_digest("[{}]"), Err(AppError::MalformedResponse(_))));
    }

    #[test]
    fn config_is_written_under_created_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config/config.yaml");
        write_config(&path, b"services: {}\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "services: {}\n");
    }
}
