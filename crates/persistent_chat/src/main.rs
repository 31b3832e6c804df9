use std::io;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chat_store::ChatStore;
use clap::Parser;
use persistent_chat::app::ChatApp;
use persistent_chat::cli::Args;
use persistent_chat::providers;
use persistent_chat::readline::EditorReader;
use persistent_chat::session::SessionController;
use signal_hook::consts::SIGINT;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let store = ChatStore::open(&args.data_dir).with_context(|| {
        format!("failed to open data directory {}", args.data_dir.display())
    })?;
    let provider =
        providers::provider_for_id(&args.provider, &args.host).map_err(|error| anyhow!(error))?;
    let profile = provider.profile();
    tracing::debug!(
        provider = %profile.provider_id,
        endpoint = profile.endpoint.as_deref().unwrap_or("-"),
        data_dir = %args.data_dir.display(),
        "starting chat"
    );

    // SIGINT only arrives while models are listed or a reply streams; the line
    // editor reads Ctrl-C as a key in raw mode.
    let cancel = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(SIGINT, Arc::clone(&cancel))
        .context("failed to install the interrupt handler")?;

    let session =
        SessionController::new(store, provider).with_failure_recording(args.failure_recording());
    let reader = EditorReader::new().context("failed to initialize the line editor")?;
    let mut app = ChatApp::new(session, reader, io::stdout(), cancel);

    app.run(args.model.clone())
}
