#[tokio::main]
async fn main() {
    if let Err(err) = d365_gateway::mcp::server::run_stdio().await {
        eprintln!("d365-gateway: {}", err);
        std::process::exit(1);
    }
}
