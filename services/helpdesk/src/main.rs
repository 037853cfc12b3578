use sea_orm::Database;
use tracing::info;

use helpdesk_api::config::HelpdeskConfig;
use helpdesk_api::domain::password::CredentialHasher;
use helpdesk_api::infra::mail::AppMailer;
use helpdesk_api::infra::storage::LocalAttachmentStore;
use helpdesk_api::router::build_router;
use helpdesk_api::state::AppState;
use helpdesk_auth_types::token::TokenSigner;
use helpdesk_core::tracing::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info,sqlx=warn");

    let config = HelpdeskConfig::from_env()?;

    let db = Database::connect(&config.database_url).await?;

    let mailer = AppMailer::from_config(config.smtp.as_ref())?;
    if matches!(mailer, AppMailer::Log(_)) {
        info!("SMTP_HOST not set; outgoing mail will only be logged");
    }

    let state = AppState {
        db,
        tokens: TokenSigner::new(config.jwt_secret, config.token_ttl_secs),
        hasher: CredentialHasher::default(),
        mailer,
        storage: LocalAttachmentStore::new(&config.attachments_dir),
        max_upload_bytes: config.max_upload_bytes,
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("helpdesk service listening on {addr}");
    axum::serve(listener, router).await?;
    Ok(())
}
