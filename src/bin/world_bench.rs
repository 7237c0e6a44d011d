use world_cache::app::BenchApp;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    BenchApp::run()
        .await
        .inspect_err(|err| tracing::error!("Application errored out: {err:#}"))
}
