//! Threads session state stored in the Config worksheet

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use log::info;

use crate::constants::{CONFIG_SHEET, TOKEN_REFRESH_THRESHOLD_DAYS};
use crate::services::sheets::{SheetsClient, SheetsError};
use crate::services::threads::{ThreadsClient, ThreadsError};

/// Credentials for the Threads account, read once at startup and
/// rewritten only when the token is refreshed.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub enum SessionError {
    Sheets(SheetsError),
    Refresh(ThreadsError),
    Invalid(String),
}

impl From<SheetsError> for SessionError {
    fn from(e: SheetsError) -> Self {
        SessionError::Sheets(e)
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Sheets(e) => write!(f, "session storage error: {}", e),
            SessionError::Refresh(e) => write!(f, "token refresh failed: {}", e),
            SessionError::Invalid(s) => write!(f, "invalid session data: {}", s),
        }
    }
}

impl std::error::Error for SessionError {}

/// Load the session from Config!A1:C1 (token, user id, expiry).
pub async fn load(sheets: &SheetsClient) -> Result<Session, SessionError> {
    let range = format!("{}!A1:C1", CONFIG_SHEET);
    let values = sheets.get_values(&range).await?;
    let cells = values.into_iter().next().unwrap_or_default();

    let access_token = cells.first().map(|s| s.trim()).unwrap_or("");
    let user_id = cells.get(1).map(|s| s.trim()).unwrap_or("");
    let expires_raw = cells.get(2).map(|s| s.trim()).unwrap_or("");

    if access_token.is_empty() {
        return Err(SessionError::Invalid("access token cell is empty".into()));
    }
    if user_id.is_empty() {
        return Err(SessionError::Invalid("user id cell is empty".into()));
    }

    let expires_at = parse_expiry(expires_raw);
    info!(
        "session loaded (token valid until {})",
        expires_at.format("%Y-%m-%d")
    );

    Ok(Session {
        access_token: access_token.to_string(),
        user_id: user_id.to_string(),
        expires_at,
    })
}

/// Write the session back to its fixed cells.
pub async fn save(sheets: &SheetsClient, session: &Session) -> Result<(), SheetsError> {
    let range = format!("{}!A1:C1", CONFIG_SHEET);
    let values = vec![vec![
        session.access_token.clone(),
        session.user_id.clone(),
        session.expires_at.to_rfc3339(),
    ]];
    sheets.update_range(&range, values).await
}

/// Refresh the token when fewer than the threshold days of validity
/// remain, persisting the new session. Refresh failure is fatal for the
/// run; a later scheduled run retries with the stored token.
pub async fn ensure_valid(
    sheets: &SheetsClient,
    threads: &ThreadsClient,
    session: Session,
) -> Result<Session, SessionError> {
    let days_left = (session.expires_at - Utc::now()).num_days();

    if days_left > TOKEN_REFRESH_THRESHOLD_DAYS {
        info!("token valid ({} days left)", days_left);
        return Ok(session);
    }

    info!("token expires in {} days, refreshing", days_left);
    let refreshed = threads
        .refresh_access_token(&session.access_token)
        .await
        .map_err(SessionError::Refresh)?;

    let session = Session {
        access_token: refreshed.access_token,
        user_id: session.user_id,
        expires_at: Utc::now() + Duration::seconds(refreshed.expires_in),
    };

    save(sheets, &session).await?;
    info!(
        "token refreshed, new expiry {}",
        session.expires_at.format("%Y-%m-%d")
    );

    Ok(session)
}

/// Parse the expiry cell. Accepts RFC 3339 and the bare
/// `YYYY-MM-DD HH:MM:SS` form the sheet tends to hold; a blank or
/// unreadable cell falls back to the token's maximum lifetime of 60 days.
fn parse_expiry(raw: &str) -> DateTime<Utc> {
    if raw.is_empty() {
        return Utc::now() + Duration::days(60);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Utc);
    }

    let normalized = raw.replace(' ', "T");
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, format) {
            return naive.and_utc();
        }
    }

    Utc::now() + Duration::days(60)
}
