use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    todo_store::cli::run().await?;
    Ok(())
}
