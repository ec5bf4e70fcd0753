//! Creates a valid Google session (access token) that we can use to call the Calendar API.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use google_calendar::{AccessToken, Client};
use icalsync_core::RemoteError;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::{debug, info};

pub const SCOPES: &[&str] = &["https://www.googleapis.com/auth/calendar"];

const REDIRECT_PORT: u16 = 8085;

pub fn redirect_uri() -> String {
    format!("http://localhost:{}/callback", REDIRECT_PORT)
}

fn redirect_address() -> String {
    format!("127.0.0.1:{}", REDIRECT_PORT)
}

/// Google OAuth client credentials (user-provided).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    fn client(&self, access_token: &str, refresh_token: &str) -> Client {
        Client::new(
            self.client_id.clone(),
            self.client_secret.clone(),
            redirect_uri(),
            access_token.to_string(),
            refresh_token.to_string(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SessionData {
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl SessionData {
    fn from_tokens(tokens: &AccessToken, previous_refresh_token: Option<&str>) -> Self {
        Self::from_parts(
            &tokens.access_token,
            &tokens.refresh_token,
            tokens.expires_in,
            previous_refresh_token,
        )
    }

    fn from_parts(
        access_token: &str,
        refresh_token: &str,
        expires_in: i64,
        previous_refresh_token: Option<&str>,
    ) -> Self {
        // Google typically doesn't return a new refresh_token on refresh
        let refresh_token = match previous_refresh_token {
            Some(previous) if refresh_token.is_empty() => previous,
            _ => refresh_token,
        };

        SessionData {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            expires_at: Utc::now() + Duration::seconds(expires_in),
        }
    }
}

/// OAuth tokens for one Google account, persisted as TOML.
pub struct Session {
    path: PathBuf,
    credentials: Credentials,
    data: SessionData,
}

impl Session {
    /// Consent page the user has to visit once to authorize icalsync.
    pub fn authorize_url(credentials: &Credentials) -> String {
        let scopes: Vec<String> = SCOPES.iter().map(|s| s.to_string()).collect();
        credentials.client("", "").user_consent_url(&scopes)
    }

    /// Exchange a one-time authorization code for tokens and store them at `path`.
    pub async fn login_with_code(
        credentials: &Credentials,
        path: &Path,
        code: &str,
        state: &str,
    ) -> Result<Self> {
        let mut client = credentials.client("", "");

        let tokens = client
            .get_access_token(code, state)
            .await
            .map_err(|e| RemoteError::AuthorizationFailed(format!("code exchange failed: {e}")))?;

        let session = Session {
            path: path.to_path_buf(),
            credentials: credentials.clone(),
            data: SessionData::from_tokens(&tokens, None),
        };
        session.save()?;

        Ok(session)
    }

    /// First-time setup: open the consent page and catch the redirect on localhost.
    pub async fn authorize_interactive(credentials: &Credentials, path: &Path) -> Result<Self> {
        let auth_url = Self::authorize_url(credentials);

        eprintln!("\nOpen this URL in your browser to authorize icalsync:\n");
        eprintln!("{}\n", auth_url);

        // Try to open the browser automatically
        if open::that(&auth_url).is_err() {
            eprintln!("(Could not open browser automatically, please copy the URL above)");
        }

        let (code, state) = wait_for_callback().await?;

        eprintln!("\nReceived authorization code, exchanging for tokens...");

        let session = Self::login_with_code(credentials, path, &code, &state).await?;

        eprintln!("Authorization successful!");

        Ok(session)
    }

    /// Load the session stored at `path`, refreshing it if expired.
    pub async fn load_valid(credentials: &Credentials, path: &Path) -> Result<Self> {
        let mut session = Self::load(credentials, path)?;

        if session.is_expired() {
            info!("access token expired, refreshing");
            session.refresh().await?;
        }

        Ok(session)
    }

    pub fn access_token(&self) -> &str {
        &self.data.access_token
    }

    fn load(credentials: &Credentials, path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Google OAuth session not found at {}", path.display());
        }

        let contents = std::fs::read_to_string(path).with_context(|| {
            format!("Failed to read Google OAuth session from {}", path.display())
        })?;

        let data: SessionData = toml::from_str(&contents).with_context(|| {
            format!("Failed to parse Google OAuth session from {}", path.display())
        })?;

        Ok(Session {
            path: path.to_path_buf(),
            credentials: credentials.clone(),
            data,
        })
    }

    pub fn save(&self) -> Result<()> {
        let contents = toml::to_string_pretty(&self.data).context("Failed to serialize session")?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write session to {}", self.path.display()))?;

        // Set to owner-only (0600) since file contains OAuth tokens:
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to set permissions on {}", self.path.display()))?;
        }

        debug!(path = %self.path.display(), "saved session");
        Ok(())
    }

    fn is_expired(&self) -> bool {
        Utc::now() >= self.data.expires_at
    }

    async fn refresh(&mut self) -> Result<()> {
        let client = self
            .credentials
            .client(&self.data.access_token, &self.data.refresh_token);

        let tokens = client
            .refresh_access_token()
            .await
            .map_err(|e| RemoteError::AuthorizationFailed(format!("token refresh failed: {e}")))?;

        self.data = SessionData::from_tokens(&tokens, Some(&self.data.refresh_token));
        self.save()?;

        Ok(())
    }
}

async fn wait_for_callback() -> Result<(String, String)> {
    let listener = TcpListener::bind(redirect_address())
        .await
        .context("Failed to bind OAuth callback listener")?;

    let (stream, _) = listener
        .accept()
        .await
        .context("Failed to accept OAuth callback")?;

    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .await
        .context("Failed to read OAuth callback request line")?;

    let (code, state) = parse_callback(&request_line)?;

    let response = "HTTP/1.1 200 OK\r\n\
        Content-Type: text/html\r\n\
        Connection: close\r\n\
        \r\n\
        <html><body>\
        <h1>icalsync is authorized</h1>\
        <p>You can close this window and return to the terminal.</p>\
        </body></html>";

    let mut stream = reader.into_inner();
    stream
        .write_all(response.as_bytes())
        .await
        .context("Failed to write OAuth callback response")?;
    stream.flush().await?;

    Ok((code, state))
}

/// Pull `code` and `state` out of the redirect's request line.
fn parse_callback(request_line: &str) -> Result<(String, String)> {
    let url_part = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("Invalid HTTP request"))?;

    let url = url::Url::parse(&format!("http://localhost{}", url_part))?;

    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.to_string())
    };

    if let Some(error) = param("error") {
        return Err(RemoteError::AuthorizationFailed(format!("consent denied: {error}")).into());
    }

    let code = param("code").ok_or_else(|| anyhow::anyhow!("No code in callback"))?;
    let state = param("state").ok_or_else(|| anyhow::anyhow!("No state in callback"))?;

    Ok((code, state))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            client_id: "id.apps.googleusercontent.com".to_string(),
            client_secret: "secret".to_string(),
        }
    }

    fn session_at(path: &Path, expires_at: DateTime<Utc>) -> Session {
        Session {
            path: path.to_path_buf(),
            credentials: credentials(),
            data: SessionData {
                access_token: "ya29.access".to_string(),
                refresh_token: "1//refresh".to_string(),
                expires_at,
            },
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.toml");
        let expires_at = Utc::now() + Duration::hours(1);

        session_at(&path, expires_at).save().unwrap();
        let loaded = Session::load(&credentials(), &path).unwrap();

        assert_eq!(loaded.access_token(), "ya29.access");
        assert_eq!(loaded.data.refresh_token, "1//refresh");
        assert!(!loaded.is_expired());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[tokio::test]
    async fn test_load_valid_keeps_fresh_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        session_at(&path, Utc::now() + Duration::hours(1)).save().unwrap();

        let session = Session::load_valid(&credentials(), &path).await.unwrap();
        assert_eq!(session.access_token(), "ya29.access");
    }

    #[test]
    fn test_missing_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Session::load(&credentials(), &dir.path().join("absent.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_at(&dir.path().join("s.toml"), Utc::now() - Duration::seconds(1));
        assert!(session.is_expired());
    }

    #[test]
    fn test_refresh_keeps_previous_refresh_token() {
        let data = SessionData::from_parts("new", "", 3600, Some("1//refresh"));
        assert_eq!(data.access_token, "new");
        assert_eq!(data.refresh_token, "1//refresh");
        assert!(data.expires_at > Utc::now());
    }

    #[test]
    fn test_parse_callback() {
        let (code, state) =
            parse_callback("GET /callback?code=4%2F0Abc&state=xyz HTTP/1.1\r\n").unwrap();
        assert_eq!(code, "4/0Abc");
        assert_eq!(state, "xyz");

        let denied = parse_callback("GET /callback?error=access_denied HTTP/1.1\r\n").unwrap_err();
        assert!(matches!(
            denied.downcast_ref::<RemoteError>(),
            Some(RemoteError::AuthorizationFailed(_))
        ));

        assert!(parse_callback("GET /callback HTTP/1.1\r\n").is_err());
    }

    #[test]
    fn test_authorize_url_requests_calendar_scope() {
        let url = Session::authorize_url(&credentials());
        assert!(url.contains("id.apps.googleusercontent.com"), "{url}");
        assert!(url.contains("calendar"), "{url}");
    }
}
