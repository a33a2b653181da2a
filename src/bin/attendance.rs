#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = scanmark::run_attendance().await {
        eprintln!("attendance fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
