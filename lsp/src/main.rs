mod analyzer;
mod error;
mod server;
mod workspace;

#[tokio::main]
async fn main() {
    server::run().await;
}
