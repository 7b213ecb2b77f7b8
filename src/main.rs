#[tokio::main]
async fn main() {
    if let Err(e) = pactum::run().await {
        eprintln!("pactum: {e}");
        std::process::exit(1);
    }
}
