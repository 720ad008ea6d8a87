#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tag_gating_cli::run().await?;
    Ok(())
}
