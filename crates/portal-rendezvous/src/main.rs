use clap::Parser;
use portal_rendezvous::registry::MailboxRegistry;
use portal_rendezvous::{build_app, relay};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "portal-rendezvous")]
#[command(about = "mailbox and relay server for portal peer pairing", long_about = None)]
struct RendezvousArgs {
    /// port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// how long a mailbox may sit idle before it's reaped
    #[arg(long, default_value_t = 600)]
    session_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal_rendezvous=info,tower_http=info".into()),
        )
        .init();

    let args = RendezvousArgs::parse();

    let registry = Arc::new(MailboxRegistry::new());
    let timeout = Duration::from_secs(args.session_timeout_secs);

    tokio::spawn(relay::run_idle_sweeper(registry.clone(), timeout));

    let app = build_app(registry);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!(%addr, session_timeout_secs = args.session_timeout_secs, "starting portal-rendezvous");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
