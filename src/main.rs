#[tokio::main]
async fn main() -> anyhow::Result<()> {
    scorebookd::serve().await
}
