use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    driftdb::cli::run().await?;
    Ok(())
}
