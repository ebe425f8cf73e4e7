mod config;
mod db;
mod errors;
mod mail;
mod routes;
mod state;
mod templates;
mod workflow;

use std::sync::Arc;

use crate::db::PgStore;
use crate::mail::{GmailTransport, MailDispatcher};
use crate::workflow::SubmissionWorkflow;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reviewdesk=info,tower_http=info".into()),
        )
        .init();

    let config = config::Config::from_env()?;

    // Fail at startup on broken templates rather than on the first send.
    templates::get_tera()?;

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(pool.as_ref()).await?;

    tracing::info!("Mail credentials: {}", config.mail.credential_summary());
    let transport = GmailTransport::new(config.mail.clone())?;
    let mailer = MailDispatcher::new(Arc::new(transport), &config.mail.excluded_addresses);

    let workflow = SubmissionWorkflow::new(
        Arc::new(PgStore::new(pool)),
        Arc::new(mailer),
        config.conference.clone(),
    );
    let app = routes::router(state::AppState {
        workflow: Arc::new(workflow),
    });

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("{} review desk listening on http://{}", config.conference.name, addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
