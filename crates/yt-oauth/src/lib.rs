use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default port for the local OAuth callback listener
pub const DEFAULT_CALLBACK_PORT: u16 = 8080;

/// Google OAuth 2.0 token endpoint
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Google OAuth 2.0 authorization page
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Scope required to search videos and post comments
pub const YOUTUBE_FORCE_SSL_SCOPE: &str = "https://www.googleapis.com/auth/youtube.force-ssl";

/// OAuth client identity as registered with the platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstalledClient {
    pub client_id: String,
    pub client_secret: String,
}

/// Client secrets file in the Google "installed app" format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSecrets {
    pub installed: InstalledClient,
}

impl ClientSecrets {
    /// Load client secrets from file
    pub fn load_from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read client secrets file '{}': {}", path, e))?;
        let secrets: ClientSecrets = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse client secrets file '{}': {}", path, e))?;
        Ok(secrets)
    }
}

/// Persisted authorization token bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredential {
    /// Access token for API requests
    pub access_token: String,
    /// Refresh token for getting new access tokens
    pub refresh_token: String,
    /// Token type (usually "Bearer")
    pub token_type: String,
    /// Expiry time as Unix timestamp (seconds since epoch)
    pub expires_at: u64,
    /// Scopes granted with this credential
    pub scopes: Vec<String>,
    /// Client identity the tokens were issued to, echoed for refresh
    pub client_id: String,
    pub client_secret: String,
}

impl StoredCredential {
    /// Check if the credential is expired or will expire soon (within 60 seconds)
    pub fn is_expired(&self) -> bool {
        let now = unix_now();
        // Consider the credential expired if it expires within 60 seconds
        now + 60 >= self.expires_at
    }

    /// Check that every required scope was granted
    pub fn covers_scopes(&self, required: &[String]) -> bool {
        required
            .iter()
            .all(|scope| self.scopes.iter().any(|granted| granted == scope))
    }

    /// Load credential from file
    pub fn load_from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read credential file '{}': {}", path, e))?;
        let credential: StoredCredential = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse credential file '{}': {}", path, e))?;
        Ok(credential)
    }

    /// Save credential to file with secure permissions
    pub fn save_to_file(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_json::to_string_pretty(self)?;

        std::fs::write(path, content)
            .map_err(|e| format!("Failed to write credential file '{}': {}", path, e))?;

        // Set secure permissions (owner read/write only) on Unix-like systems
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(path, permissions).map_err(|e| {
                format!("Failed to set permissions on credential file '{}': {}", path, e)
            })?;
        }

        Ok(())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs()
}

/// Build a credential out of a token endpoint response. Refresh responses
/// omit the refresh token, in which case the previous one is carried over.
fn credential_from_response(
    body: &serde_json::Value,
    previous_refresh_token: Option<&str>,
    requested_scopes: &[String],
    client_id: &str,
    client_secret: &str,
) -> Result<StoredCredential, Box<dyn std::error::Error>> {
    let access_token = body
        .get("access_token")
        .and_then(|v| v.as_str())
        .ok_or("Missing access_token in token response")?
        .to_string();

    let refresh_token = match body.get("refresh_token").and_then(|v| v.as_str()) {
        Some(token) => token.to_string(),
        None => previous_refresh_token
            .ok_or("Missing refresh_token in token response")?
            .to_string(),
    };

    let expires_in = body
        .get("expires_in")
        .and_then(|v| v.as_u64())
        .ok_or("Missing expires_in in token response")?;

    let scopes = match body.get("scope").and_then(|v| v.as_str()) {
        Some(granted) => granted.split_whitespace().map(str::to_string).collect(),
        None => requested_scopes.to_vec(),
    };

    Ok(StoredCredential {
        access_token,
        refresh_token,
        token_type: body
            .get("token_type")
            .and_then(|v| v.as_str())
            .unwrap_or("Bearer")
            .to_string(),
        expires_at: unix_now() + expires_in,
        scopes,
        client_id: client_id.to_string(),
        client_secret: client_secret.to_string(),
    })
}

/// Generate PKCE verifier and challenge
fn generate_pkce() -> (String, String) {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use rand::Rng;
    use rand::distributions::Alphanumeric;
    use sha2::{Digest, Sha256};

    // Generate random verifier (43-128 characters) using cryptographically secure RNG
    let verifier: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();

    // Generate challenge: base64url(SHA256(verifier))
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    let hash = hasher.finalize();
    let challenge = URL_SAFE_NO_PAD.encode(hash);

    (verifier, challenge)
}

/// Owns the persisted credential and the paths and endpoints needed to
/// replace it. Hands out credentials, never mutable access to them.
pub struct CredentialStore {
    secrets_path: String,
    token_path: String,
    scopes: Vec<String>,
    token_url: String,
    callback_port: u16,
    http: reqwest::Client,
}

impl CredentialStore {
    /// Create a store backed by the given client secrets and credential files
    pub fn new(secrets_path: &str, token_path: &str, scopes: Vec<String>) -> Self {
        Self {
            secrets_path: secrets_path.to_string(),
            token_path: token_path.to_string(),
            scopes,
            token_url: GOOGLE_TOKEN_URL.to_string(),
            callback_port: DEFAULT_CALLBACK_PORT,
            http: reqwest::Client::new(),
        }
    }

    /// Override the token endpoint (for tests and mock servers)
    pub fn with_token_url(mut self, token_url: &str) -> Self {
        self.token_url = token_url.to_string();
        self
    }

    /// Override the local callback listener port
    pub fn with_callback_port(mut self, port: u16) -> Self {
        self.callback_port = port;
        self
    }

    /// Produce a usable credential, from cheapest source to most expensive:
    /// reuse the persisted one if still valid, refresh it if expired but
    /// refreshable, otherwise run the interactive authorization flow.
    ///
    /// A malformed credential file is fatal. A failed refresh is not: it
    /// falls through to interactive re-authorization.
    pub async fn acquire(&self) -> Result<StoredCredential, Box<dyn std::error::Error>> {
        let stored = if std::path::Path::new(&self.token_path).exists() {
            Some(StoredCredential::load_from_file(&self.token_path)?)
        } else {
            None
        };

        if let Some(credential) = &stored {
            if credential.covers_scopes(&self.scopes) {
                if !credential.is_expired() {
                    return Ok(credential.clone());
                }

                if !credential.refresh_token.is_empty() {
                    match self.refresh(credential).await {
                        Ok(refreshed) => {
                            refreshed.save_to_file(&self.token_path)?;
                            return Ok(refreshed);
                        }
                        Err(e) => {
                            eprintln!("Token refresh failed: {}", e);
                            eprintln!("Falling back to interactive authorization...");
                        }
                    }
                }
            }
        }

        let credential = self.interactive_flow().await?;
        credential.save_to_file(&self.token_path)?;
        Ok(credential)
    }

    /// Exchange the refresh token for a new access token
    async fn refresh(
        &self,
        current: &StoredCredential,
    ) -> Result<StoredCredential, Box<dyn std::error::Error>> {
        eprintln!("Access token expired, refreshing...");

        let params = [
            ("client_id", current.client_id.as_str()),
            ("client_secret", current.client_secret.as_str()),
            ("refresh_token", current.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self.http.post(&self.token_url).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            return Err(format!(
                "Failed to refresh credential (status {}): {}",
                status, body
            )
            .into());
        }

        let body: serde_json::Value = response.json().await?;
        let refreshed = credential_from_response(
            &body,
            Some(&current.refresh_token),
            &current.scopes,
            &current.client_id,
            &current.client_secret,
        )?;

        eprintln!("Credential refreshed successfully");

        Ok(refreshed)
    }

    fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/oauth2callback", self.callback_port)
    }

    /// Generate authorization URL and the PKCE verifier that goes with it
    pub fn authorization_url(&self, client: &InstalledClient) -> (String, String) {
        let (verifier, challenge) = generate_pkce();

        let auth_url = format!(
            "{}?\
            client_id={}&\
            redirect_uri={}&\
            response_type=code&\
            scope={}&\
            code_challenge={}&\
            code_challenge_method=S256&\
            access_type=offline&\
            prompt=consent",
            GOOGLE_AUTH_URL,
            urlencoding::encode(&client.client_id),
            urlencoding::encode(&self.redirect_uri()),
            urlencoding::encode(&self.scopes.join(" ")),
            urlencoding::encode(&challenge),
        );

        (auth_url, verifier)
    }

    /// Exchange an authorization code for tokens
    async fn exchange_code(
        &self,
        client: &InstalledClient,
        code: &str,
        verifier: &str,
    ) -> Result<StoredCredential, Box<dyn std::error::Error>> {
        eprintln!("Exchanging authorization code for tokens...");

        let redirect_uri = self.redirect_uri();
        let params = [
            ("client_id", client.client_id.as_str()),
            ("client_secret", client.client_secret.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri.as_str()),
        ];

        let response = self.http.post(&self.token_url).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            return Err(format!(
                "Failed to exchange authorization code (status {}): {}",
                status, body
            )
            .into());
        }

        let body: serde_json::Value = response.json().await?;
        let credential = credential_from_response(
            &body,
            None,
            &self.scopes,
            &client.client_id,
            &client.client_secret,
        )?;

        eprintln!("Successfully obtained OAuth tokens");

        Ok(credential)
    }

    /// Run the interactive authorization flow with a local callback server.
    /// Blocks until the browser redirect delivers a code, the user denies
    /// the grant, or the 5 minute timeout passes.
    async fn interactive_flow(&self) -> Result<StoredCredential, Box<dyn std::error::Error>> {
        use std::sync::Arc;
        use tokio::sync::Mutex;

        let secrets = ClientSecrets::load_from_file(&self.secrets_path)?;
        let client = secrets.installed;

        let (auth_url, verifier) = self.authorization_url(&client);

        eprintln!("\n=================================================");
        eprintln!("OAuth 2.0 Authorization Required");
        eprintln!("=================================================");
        eprintln!("\nPlease visit the following URL to authorize the application:\n");
        eprintln!("{}\n", auth_url);
        eprintln!("Waiting for authorization...");
        eprintln!("=================================================\n");

        // Shared state for the callback outcome: a code, or a denial
        let callback_outcome = Arc::new(Mutex::new(None::<Result<String, String>>));
        let callback_writer = callback_outcome.clone();

        use axum::{
            Router,
            extract::Query,
            response::{Html, IntoResponse},
            routing::get,
        };

        #[derive(Deserialize)]
        struct AuthCallback {
            code: Option<String>,
            error: Option<String>,
        }

        let callback_handler = move |Query(params): Query<AuthCallback>| async move {
            if let Some(error) = params.error {
                *callback_writer.lock().await = Some(Err(error.clone()));
                return Html(format!(
                    "<html><body><h1>Authorization Failed</h1><p>Error: {}</p>\
                    <p>You can close this window.</p></body></html>",
                    error
                ))
                .into_response();
            }

            if let Some(code) = params.code {
                *callback_writer.lock().await = Some(Ok(code));
                return Html(
                    "<html><body><h1>Authorization Successful!</h1>\
                    <p>You can close this window and return to the application.</p></body></html>",
                )
                .into_response();
            }

            Html("<html><body><h1>Authorization Failed</h1><p>No code received</p></body></html>")
                .into_response()
        };

        let app = Router::new().route("/oauth2callback", get(callback_handler));

        let listener =
            tokio::net::TcpListener::bind(format!("127.0.0.1:{}", self.callback_port)).await?;
        let server = axum::serve(listener, app);

        // Run server until we get an outcome
        let server_handle = tokio::spawn(async move {
            server.await.ok();
        });

        // Wait for the callback (with timeout)
        let timeout = tokio::time::Duration::from_secs(300); // 5 minutes
        let start = tokio::time::Instant::now();

        let outcome = loop {
            if start.elapsed() > timeout {
                server_handle.abort();
                return Err("OAuth authorization timeout (5 minutes)".into());
            }

            let received = callback_outcome.lock().await.take();
            if let Some(outcome) = received {
                break outcome;
            }

            tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
        };

        server_handle.abort();

        let code = outcome.map_err(|error| format!("Authorization was not granted: {}", error))?;

        self.exchange_code(&client, &code, &verifier).await
    }
}
