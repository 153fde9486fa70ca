#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = physics_tutor::run_worker().await {
        eprintln!("physics-tutor-worker fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
