mod app;
mod control;
mod relays;
mod sensor;
mod server;
mod state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::run().await
}
