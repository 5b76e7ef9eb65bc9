use anyhow::Result;

use joycycles_journal::config::Config;
use joycycles_journal::routes;
use joycycles_journal::storage::{JsonFileStore, Persistence};
use joycycles_journal::store::AppStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let backend = JsonFileStore::open(&config.data_dir)?;
    let store = routes::shared(AppStore::load(Persistence::new(backend)));

    let app = routes::app(store);

    let addr = config.bind_address;
    tracing::info!("🧠 Journal running at {} (data in {})", addr, config.data_dir.display());

    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service(),
    )
    .await?;

    Ok(())
}
