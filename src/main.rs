use anyhow::Context;
use libreria_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load Librería settings")?;
    libreria_telemetry::init(&settings.telemetry)?;

    libreria_app::run(settings).await
}
