#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = physics_tutor::run().await {
        eprintln!("physics-tutor fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
