use devsummit::api::server;
use devsummit::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;
    server::run_server(settings).await
}
