#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cars::app::run().await
}
