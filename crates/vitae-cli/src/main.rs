//! `vitae` binary

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = vitae_cli::build_cli().get_matches();
    let mut stdout = std::io::stdout();

    match vitae_cli::execute(&matches, &mut stdout).await {
        Ok(ok) => std::process::exit(if ok { 0 } else { 1 }),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    }
}
