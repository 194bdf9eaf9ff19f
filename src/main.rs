use apimaster::cli::Cli;

#[tokio::main]
async fn main() {
    // Parse arguments and execute the selected command
    if let Err(e) = Cli::run().await {
        eprintln!("✗ Error: {}", e);
        std::process::exit(1);
    }
}
