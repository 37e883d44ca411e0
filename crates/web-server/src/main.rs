use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

// This main function is the entry point when running `cargo run -p web-server`.
// Its only job is to load the configuration and call `run_server`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = configuration::load_config()?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    web_server::run_server(addr, config.default_top_n()).await
}
