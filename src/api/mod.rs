pub mod models;

use std::collections::HashMap;
use std::time::Duration;

use log::{info, warn};
use reqwest::Client;
use uuid::Uuid;

use crate::config::{Config, credentials};
use crate::platform;
use models::{LoginResponse, ReleaseMetadata, ReleaseMetadataContainer};

/// Client for the backend API: one login call, one release lookup.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    api_root: String,
}

impl ApiClient {
    pub fn new(api_root: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|err| {
                warn!("api: falling back to default HTTP client configuration ({err})");
                Client::new()
            });
        Self {
            client,
            api_root: api_root.into(),
        }
    }

    /// Borrow the underlying HTTP client so downloads reuse the same pool.
    pub fn http(&self) -> &Client {
        &self.client
    }

    /// Exchange the configured credentials for a bearer token. One attempt,
    /// no retry; a failure here is fatal to the whole launch.
    pub async fn login(&self) -> Result<String, String> {
        let (email, password) = credentials();
        let mut body = HashMap::new();
        body.insert("email", email);
        body.insert("password", password);

        let url = format!("{}/auth/login", self.api_root);
        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("login request failed: {e}"))?;

        let status = resp.status();
        let login: LoginResponse = resp
            .json()
            .await
            .map_err(|e| format!("login response parse error: {e}"))?;

        match login.status.as_str() {
            "ok" => login
                .data
                .ok_or_else(|| "login response missing token".to_string()),
            "error" => Err(format!(
                "authentication error {}: {}",
                status.as_u16(),
                login.message.unwrap_or_default()
            )),
            other => Err(format!(
                "unexpected login status {other:?}: {}",
                login.message.unwrap_or_default()
            )),
        }
    }

    /// Fetch the latest release descriptor for the configured app on the
    /// current platform, as a Server deployment in the environment's build
    /// configuration.
    pub async fn fetch_latest_release(
        &self,
        token: &str,
        config: &Config,
    ) -> Result<ReleaseMetadata, String> {
        let platform = platform::platform_name()?;
        let configuration = config.environment.configuration();
        let url = format!(
            "{}/apps/{}/releases/latest",
            self.api_root, config.app_id
        );

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("platform", platform),
                ("deployment", "Server"),
                ("configuration", configuration),
            ])
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| format!("release request failed: {e}"))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| format!("release response read error: {e}"))?;
        if !status.is_success() {
            return Err(format!(
                "failed to fetch the latest release, status code: {}, body: {body}",
                status.as_u16()
            ));
        }

        let container: ReleaseMetadataContainer = serde_json::from_str(&body)
            .map_err(|e| format!("failed to parse release metadata: {e}"))?;
        let mut release = container.data;

        // The echoed app id is not trusted; back-fill from our own config.
        match Uuid::parse_str(&config.app_id) {
            Ok(app_id) => release.app_id = app_id,
            Err(err) => warn!("release: failed to parse appId: {err}"),
        }

        info!(
            "release: {} {} with {} file(s)",
            release.app_name,
            release.version,
            release.files.len()
        );
        Ok(release)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use std::env;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    const APP_ID: &str = "9e107d9d-372b-4b19-a788-133d4253c6f2";

    fn json_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    /// Serve one request with a canned response and hand back the raw
    /// request bytes for assertions on the request line, headers and body.
    fn serve_once(listener: TcpListener, response: String) -> JoinHandle<String> {
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut data = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                data.extend_from_slice(&buf[..n]);
                if request_complete(&data) {
                    break;
                }
            }
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;
            String::from_utf8_lossy(&data).into_owned()
        })
    }

    fn request_complete(data: &[u8]) -> bool {
        let text = String::from_utf8_lossy(data);
        let Some(head_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..head_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                if name.eq_ignore_ascii_case("content-length") {
                    value.trim().parse::<usize>().ok()
                } else {
                    None
                }
            })
            .unwrap_or(0);
        data.len() >= head_end + 4 + content_length
    }

    async fn bound_listener() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let root = format!("http://{}", listener.local_addr().unwrap());
        (listener, root)
    }

    fn test_config(api_root: String) -> Config {
        Config {
            environment: Environment::Dev,
            app_id: APP_ID.to_string(),
            api_root,
            depth: 4,
        }
    }

    #[tokio::test]
    async fn login_posts_credentials_and_yields_the_token() {
        // SAFETY: no other test reads these variables.
        unsafe {
            env::set_var("USER_EMAIL", "admin@example.com");
            env::set_var("USER_PASSWORD", "hunter2");
        }
        let (listener, root) = bound_listener().await;
        let served = serve_once(
            listener,
            json_response("200 OK", r#"{"status":"ok","data":"tok-123"}"#),
        );

        let token = ApiClient::new(root).login().await.unwrap();
        assert_eq!(token, "tok-123");

        let request = served.await.unwrap();
        assert!(
            request.starts_with("POST /auth/login HTTP/1.1"),
            "request line: {}",
            request.lines().next().unwrap_or("")
        );
        assert!(request.contains("admin@example.com"));
        assert!(request.contains("hunter2"));
    }

    #[tokio::test]
    async fn login_error_status_carries_code_and_message() {
        let (listener, root) = bound_listener().await;
        let served = serve_once(
            listener,
            json_response(
                "401 Unauthorized",
                r#"{"status":"error","message":"bad credentials"}"#,
            ),
        );

        let err = ApiClient::new(root).login().await.unwrap_err();
        assert_eq!(err, "authentication error 401: bad credentials");
        served.await.unwrap();
    }

    #[tokio::test]
    async fn release_request_carries_query_and_bearer_token() {
        let (listener, root) = bound_listener().await;
        let body = format!(
            r#"{{"data":{{"appId":"{APP_ID}","appName":"Foo","version":"1.4.2","files":[]}}}}"#
        );
        let served = serve_once(listener, json_response("200 OK", &body));

        let config = test_config(root);
        let client = ApiClient::new(config.api_root.clone());
        let release = client
            .fetch_latest_release("tok-123", &config)
            .await
            .unwrap();
        assert_eq!(release.app_id.to_string(), APP_ID);
        assert_eq!(release.app_name, "Foo");

        let request = served.await.unwrap();
        let platform = crate::platform::platform_name().unwrap();
        let expected = format!(
            "GET /apps/{APP_ID}/releases/latest?platform={platform}&deployment=Server&configuration=Development HTTP/1.1"
        );
        assert!(
            request.starts_with(&expected),
            "request line: {}",
            request.lines().next().unwrap_or("")
        );
        let lowered = request.to_lowercase();
        assert!(lowered.contains("authorization: bearer tok-123"));
    }

    #[tokio::test]
    async fn release_fetch_fails_on_error_status() {
        let (listener, root) = bound_listener().await;
        let served = serve_once(listener, json_response("503 Service Unavailable", "{}"));

        let config = test_config(root);
        let client = ApiClient::new(config.api_root.clone());
        let err = client
            .fetch_latest_release("tok-123", &config)
            .await
            .unwrap_err();
        assert!(err.contains("status code: 503"), "unexpected error: {err}");
        served.await.unwrap();
    }
}
