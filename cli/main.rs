mod app;
mod config;
mod utils;

fn main() -> anyhow::Result<()> {
    let (mut app, _guard) = app::Pgex::new()?;
    app.run()
}
