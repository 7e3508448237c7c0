use anyhow::Result;
use dental_mcp::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
