//! Entrypoint for the `quota-demo` binary.

#[tokio::main]
async fn main() {
    let code = quota_cli::run().await;
    std::process::exit(code);
}
