use clap::Parser;
use std::net::IpAddr;

use crate::config::{DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_IDLE_MINUTES};
use crate::storage::constants::DEFAULT_MAX_UPLOAD_MB;

/// Browse, upload, download and delete objects in a storage container from a web page
#[derive(Parser, Debug, Clone)]
#[command(name = "blobnav")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Storage backend: azblob or memory
    #[arg(long, default_value = "azblob")]
    pub provider: String,

    /// Blob endpoint override, e.g. http://127.0.0.1:10000/devstoreaccount1 for Azurite
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Keep browsing below this prefix of the container
    #[arg(long, default_value = "")]
    pub root_prefix: String,

    /// Only list and accept files with this extension (repeatable), e.g. .xlsx
    #[arg(long = "allowed-extension", value_name = "EXT")]
    pub allowed_extensions: Vec<String>,

    /// List names starting with '.'
    #[arg(long)]
    pub show_hidden: bool,

    /// Do not show size and modification time columns
    #[arg(long)]
    pub hide_file_details: bool,

    /// IANA timezone used to display modification times
    #[arg(long, default_value = "UTC")]
    pub timezone: String,

    /// Largest accepted upload request, in MiB
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_MB)]
    pub max_upload_mb: usize,

    /// Seconds to wait for in-flight requests on shutdown
    #[arg(long, default_value_t = 10)]
    pub shutdown_timeout: u64,

    /// Minutes of inactivity after which a browser session is dropped
    #[arg(long, default_value_t = DEFAULT_SESSION_IDLE_MINUTES)]
    pub session_idle_minutes: u64,

    /// Most browser sessions kept at once
    #[arg(long, default_value_t = DEFAULT_MAX_SESSIONS)]
    pub max_sessions: usize,

    /// Prefill the account field of the connect form
    #[arg(long)]
    pub default_account: Option<String>,

    /// Prefill the container field of the connect form
    #[arg(long)]
    pub default_container: Option<String>,
}
