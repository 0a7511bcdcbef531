#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = quiziti_rust::run().await {
        eprintln!("quiziti-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
