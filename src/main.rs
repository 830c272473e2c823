//! Shortener service entry point.

use shortener::run;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run().await
}
