use jiff::Timestamp;
use jiff::tz::TimeZone;
use snafu::ensure;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::cli::Args;
use crate::cursor::normalize_prefix;
use crate::error::{Error, Result, ValidationSnafu};
use crate::storage::StorageProvider;
use crate::storage::constants::{DEFAULT_MAX_UPLOAD_MB, PREVIEW_MAX_BYTES};

const TIME_FORMAT: &str = "%Y-%m-%d %I:%M %p";

pub const DEFAULT_SESSION_IDLE_MINUTES: u64 = 30;
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

/// Everything the process needs, validated before the server binds
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub browser: BrowserConfig,
    pub provider: StorageProvider,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            shutdown_timeout: 10,
        }
    }
}

impl ServerConfig {
    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn binds_to_all_interfaces(&self) -> bool {
        self.host.is_unspecified()
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }
}

/// Presentation and filtering options of the browser view
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Normalized prefix the browser cannot leave; empty for the container root.
    pub root_prefix: String,
    /// Lowercased extensions including the dot. Empty allows everything.
    pub allowed_extensions: Vec<String>,
    pub show_hidden: bool,
    pub show_file_details: bool,
    pub timezone: TimeZone,
    pub max_upload_bytes: usize,
    /// Objects larger than this are not fetched for an inline preview.
    pub preview_max_bytes: u64,
    pub default_account: Option<String>,
    pub default_container: Option<String>,
    /// Sessions unused for this long are dropped.
    pub session_idle_timeout: Duration,
    /// Upper bound on live sessions; the least recently used one is dropped first.
    pub max_sessions: usize,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            root_prefix: String::new(),
            allowed_extensions: Vec::new(),
            show_hidden: false,
            show_file_details: true,
            timezone: TimeZone::UTC,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
            preview_max_bytes: PREVIEW_MAX_BYTES,
            default_account: None,
            default_container: None,
            session_idle_timeout: Duration::from_secs(DEFAULT_SESSION_IDLE_MINUTES * 60),
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

impl BrowserConfig {
    /// Whether a file name passes the extension allow-list.
    pub fn is_extension_allowed(&self, name: &str) -> bool {
        if self.allowed_extensions.is_empty() {
            return true;
        }
        let lower = name.to_lowercase();
        self.allowed_extensions
            .iter()
            .any(|ext| lower.ends_with(ext.as_str()))
    }

    /// Render a timestamp in the configured timezone.
    pub fn format_time(&self, timestamp: Timestamp) -> String {
        timestamp
            .to_zoned(self.timezone.clone())
            .strftime(TIME_FORMAT)
            .to_string()
    }
}

/// Normalize one `--allowed-extension` value to `.ext` in lowercase.
fn normalize_extension(ext: &str) -> Result<String> {
    let trimmed = ext.trim().trim_start_matches('.').to_lowercase();
    ensure!(
        !trimmed.is_empty() && !trimmed.contains('/'),
        ValidationSnafu {
            message: format!("'{ext}' is not a file extension")
        }
    );
    Ok(format!(".{trimmed}"))
}

/// Build and validate the process configuration from command line arguments
pub fn load_config(args: &Args) -> Result<AppConfig> {
    let provider = StorageProvider::from_str(&args.provider)?;

    let timezone = TimeZone::get(&args.timezone).map_err(|_| Error::InvalidTimezone {
        name: args.timezone.clone(),
    })?;

    ensure!(
        args.max_upload_mb > 0,
        ValidationSnafu {
            message: "--max-upload-mb must be at least 1".to_string()
        }
    );
    ensure!(
        args.max_sessions > 0 && args.session_idle_minutes > 0,
        ValidationSnafu {
            message: "--max-sessions and --session-idle-minutes must be at least 1".to_string()
        }
    );
    ensure!(
        args.port != 0,
        ValidationSnafu {
            message: "--port must not be 0".to_string()
        }
    );

    let allowed_extensions = args
        .allowed_extensions
        .iter()
        .map(|ext| normalize_extension(ext))
        .collect::<Result<Vec<_>>>()?;

    let browser = BrowserConfig {
        root_prefix: normalize_prefix(&args.root_prefix)?,
        allowed_extensions,
        show_hidden: args.show_hidden,
        show_file_details: !args.hide_file_details,
        timezone,
        max_upload_bytes: args.max_upload_mb * 1024 * 1024,
        preview_max_bytes: PREVIEW_MAX_BYTES,
        default_account: args.default_account.clone(),
        default_container: args.default_container.clone(),
        session_idle_timeout: Duration::from_secs(args.session_idle_minutes * 60),
        max_sessions: args.max_sessions,
    };

    let server = ServerConfig {
        host: args.host,
        port: args.port,
        shutdown_timeout: args.shutdown_timeout,
    };

    Ok(AppConfig {
        server,
        browser,
        provider,
        endpoint: args.endpoint.clone(),
    })
}
