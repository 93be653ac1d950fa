//! Application constants

/// Threads Graph API base URL
pub const THREADS_API_BASE: &str = "https://graph.threads.net/v1.0";

/// Threads token refresh endpoint (lives outside the versioned base)
pub const THREADS_REFRESH_URL: &str = "https://graph.threads.net/refresh_access_token";

/// Google OAuth2 token exchange endpoint for service accounts
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// OAuth scope required for reading and writing sheet values
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Extensions treated as video when classifying media paths
pub const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".mov", ".avi", ".mkv", ".flv", ".wmv"];

/// Wait after submitting a video container (remote transcoding)
pub const VIDEO_PROCESSING_WAIT_SECS: u64 = 30;

/// Wait after submitting an image container
pub const IMAGE_PROCESSING_WAIT_SECS: u64 = 5;

/// Courtesy delay between consecutive posts in one group
pub const INTER_POST_DELAY_SECS: u64 = 3;

/// Refresh the Threads token when fewer days than this remain
pub const TOKEN_REFRESH_THRESHOLD_DAYS: i64 = 7;

/// Worksheet holding content rows
pub const POSTS_SHEET: &str = "Posts";

/// Worksheet holding the session cells
pub const CONFIG_SHEET: &str = "Config";

/// Number of header rows above the data in the Posts sheet
pub const HEADER_ROWS: u32 = 1;

/// Column written with the TRUE/FALSE posted flag
pub const POSTED_COLUMN: &str = "C";

/// Column written with the published post id
pub const POST_ID_COLUMN: &str = "F";
