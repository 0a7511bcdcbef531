#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = quiziti_rust::run_worker().await {
        eprintln!("quiziti-worker fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
