//! Server configuration
//!
//! Every option can come from a flag or a `GATEKEEP_*` environment variable.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use gatekeep_core::{
    Error, HttpUploadService, LocalUploadService, PasswordGate, TokenConfig, UploadService,
};

#[derive(Parser, Debug, Clone)]
#[command(name = "gatekeep")]
#[command(author, version, about = "Account registration and session credential server", long_about = None)]
pub struct ServerArgs {
    /// Address to listen on
    #[arg(long, env = "GATEKEEP_BIND", default_value = "127.0.0.1:8000")]
    pub bind: String,

    /// Database path (defaults to the platform data directory)
    #[arg(long, env = "GATEKEEP_DB_PATH")]
    pub db: Option<String>,

    /// Secret used to sign access tokens (random per process when unset)
    #[arg(long, env = "GATEKEEP_ACCESS_TOKEN_SECRET", hide_env_values = true)]
    pub access_token_secret: Option<String>,

    /// Secret used to sign refresh tokens (random per process when unset)
    #[arg(long, env = "GATEKEEP_REFRESH_TOKEN_SECRET", hide_env_values = true)]
    pub refresh_token_secret: Option<String>,

    /// Access token lifetime in seconds
    #[arg(long, env = "GATEKEEP_ACCESS_TOKEN_TTL_SECS", default_value_t = 15 * 60)]
    pub access_token_ttl_secs: i64,

    /// Refresh token lifetime in seconds
    #[arg(long, env = "GATEKEEP_REFRESH_TOKEN_TTL_SECS", default_value_t = 10 * 24 * 60 * 60)]
    pub refresh_token_ttl_secs: i64,

    /// bcrypt cost factor
    #[arg(long, env = "GATEKEEP_BCRYPT_COST", default_value_t = 10)]
    pub bcrypt_cost: u32,

    /// Remote upload endpoint. When unset, images are stored in --media-dir.
    #[arg(long, env = "GATEKEEP_UPLOAD_URL")]
    pub upload_url: Option<String>,

    /// Bearer key sent to the remote upload endpoint
    #[arg(long, env = "GATEKEEP_UPLOAD_API_KEY", hide_env_values = true)]
    pub upload_api_key: Option<String>,

    /// Upload preset sent to the remote upload endpoint
    #[arg(long, env = "GATEKEEP_UPLOAD_PRESET")]
    pub upload_preset: Option<String>,

    /// Remote upload timeout in seconds
    #[arg(long, env = "GATEKEEP_UPLOAD_TIMEOUT_SECS", default_value_t = 30)]
    pub upload_timeout_secs: u64,

    /// Directory for locally stored images
    #[arg(long, env = "GATEKEEP_MEDIA_DIR")]
    pub media_dir: Option<String>,

    /// Public URL prefix for locally stored images
    #[arg(long, env = "GATEKEEP_MEDIA_BASE_URL")]
    pub media_base_url: Option<String>,

    /// Origin allowed to send credentialed cross-origin requests
    #[arg(long, env = "GATEKEEP_CORS_ORIGIN")]
    pub cors_origin: Option<String>,

    /// Largest accepted registration body, in bytes
    #[arg(long, env = "GATEKEEP_MAX_UPLOAD_BYTES", default_value_t = 10 * 1024 * 1024)]
    pub max_upload_bytes: usize,
}

/// HTTP-level settings shared with the router
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub cors_origin: Option<String>,
    /// Served under `/media` when images are stored locally
    pub media_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            cors_origin: None,
            media_dir: None,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

fn ttl_from_secs(secs: i64, name: &str) -> gatekeep_core::Result<chrono::Duration> {
    chrono::Duration::try_seconds(secs)
        .ok_or_else(|| Error::config(format!("The {} token lifetime is out of range", name)))
}

/// Expand `~` and environment variables in a user supplied path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

impl ServerArgs {
    pub fn db_path(&self) -> Option<PathBuf> {
        self.db.as_deref().map(expand_path)
    }

    pub fn token_config(&self) -> gatekeep_core::Result<TokenConfig> {
        TokenConfig::from_optional_secrets(
            self.access_token_secret.clone(),
            self.refresh_token_secret.clone(),
        )?
        .with_access_ttl(ttl_from_secs(self.access_token_ttl_secs, "access")?)?
        .with_refresh_ttl(ttl_from_secs(self.refresh_token_ttl_secs, "refresh")?)
    }

    pub fn password_gate(&self) -> gatekeep_core::Result<PasswordGate> {
        PasswordGate::new(self.bcrypt_cost)
    }

    /// Directory used for local image storage
    pub fn media_dir(&self) -> gatekeep_core::Result<PathBuf> {
        if let Some(dir) = &self.media_dir {
            return Ok(expand_path(dir));
        }
        let dirs = directories::ProjectDirs::from("com", "gatekeep", "Gatekeep")
            .ok_or_else(|| Error::config("Could not determine project directories"))?;
        Ok(dirs.data_dir().join("media"))
    }

    fn media_base_url(&self) -> String {
        if let Some(url) = &self.media_base_url {
            return url.clone();
        }

        // A wildcard bind address is not reachable by clients
        match self.bind.parse::<SocketAddr>() {
            Ok(addr) if addr.ip().is_unspecified() => {
                log::warn!(
                    "[config] Listening on {} without --media-base-url; image URLs will point at localhost",
                    self.bind
                );
                format!("http://localhost:{}/media", addr.port())
            }
            _ => format!("http://{}/media", self.bind),
        }
    }

    /// Pick the upload backend: remote when an endpoint is configured,
    /// otherwise the local media directory.
    pub fn upload_service(&self) -> gatekeep_core::Result<Arc<dyn UploadService>> {
        match &self.upload_url {
            Some(url) => {
                log::info!("[config] Uploading images to {}", url);
                let service = HttpUploadService::new(
                    url.clone(),
                    self.upload_api_key.clone(),
                    self.upload_preset.clone(),
                    Duration::from_secs(self.upload_timeout_secs),
                )?;
                Ok(Arc::new(service))
            }
            None => {
                let dir = self.media_dir()?;
                log::info!("[config] Storing images in {}", dir.display());
                Ok(Arc::new(LocalUploadService::new(dir, self.media_base_url())))
            }
        }
    }

    pub fn http_settings(&self) -> gatekeep_core::Result<HttpSettings> {
        let media_dir = match self.upload_url {
            Some(_) => None,
            None => Some(self.media_dir()?),
        };
        Ok(HttpSettings {
            cors_origin: self.cors_origin.clone(),
            media_dir,
            max_upload_bytes: self.max_upload_bytes,
        })
    }
}
