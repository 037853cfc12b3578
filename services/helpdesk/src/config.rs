use anyhow::{Context, bail};

use helpdesk_auth_types::token::DEFAULT_TOKEN_TTL_SECS;

/// SMTP relay settings. Absent when `SMTP_HOST` is unset.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    /// Default 587 (submission with STARTTLS). Env var: `SMTP_PORT`.
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender address. Env var: `SMTP_FROM`, falling back to `SMTP_USER`.
    pub from: String,
}

/// Helpdesk service configuration loaded from environment variables.
#[derive(Debug)]
pub struct HelpdeskConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// HMAC secret for signing session tokens.
    pub jwt_secret: String,
    /// Session token lifetime in seconds. Env var: `JWT_EXP_MINUTES` (default 1440).
    pub token_ttl_secs: u64,
    /// TCP port to listen on (default 8000). Env var: `HELPDESK_PORT`.
    pub port: u16,
    /// Root directory of the attachment store. Env var: `ATTACHMENTS_DIR`.
    pub attachments_dir: String,
    /// Request body cap for uploads in bytes. Env var: `MAX_UPLOAD_BYTES`.
    pub max_upload_bytes: usize,
    pub smtp: Option<SmtpConfig>,
}

impl HelpdeskConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = get("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = get("JWT_SECRET").context("JWT_SECRET must be set")?;
        if jwt_secret.is_empty() {
            bail!("JWT_SECRET must not be empty");
        }

        let token_ttl_secs = match get("JWT_EXP_MINUTES") {
            Some(v) => {
                let minutes: u64 = v.parse().context("JWT_EXP_MINUTES must be an integer")?;
                if minutes == 0 {
                    bail!("JWT_EXP_MINUTES must be positive");
                }
                match minutes.checked_mul(60) {
                    Some(secs) => secs,
                    None => bail!("JWT_EXP_MINUTES is too large"),
                }
            }
            None => DEFAULT_TOKEN_TTL_SECS,
        };

        let smtp = match get("SMTP_HOST").filter(|h| !h.is_empty()) {
            Some(host) => {
                let username = get("SMTP_USER");
                let from = get("SMTP_FROM")
                    .or_else(|| username.clone())
                    .context("SMTP_FROM or SMTP_USER must be set when SMTP_HOST is set")?;
                Some(SmtpConfig {
                    host,
                    port: parse_or(&get, "SMTP_PORT", 587)?,
                    username,
                    password: get("SMTP_PASS"),
                    from,
                })
            }
            None => None,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            token_ttl_secs,
            port: parse_or(&get, "HELPDESK_PORT", 8000)?,
            attachments_dir: get("ATTACHMENTS_DIR").unwrap_or_else(|| "attachments".to_owned()),
            max_upload_bytes: parse_or(&get, "MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            smtp,
        })
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(v) => v.parse().with_context(|| format!("{key} is not valid: {v:?}")),
        None => Ok(default),
    }
}
