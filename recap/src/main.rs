use recap_config::RecapConfig;
use recap_core::master::Master;
use utils::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut cfg = RecapConfig::from_file_or_default("recap.conf");

    // Single optional CLI argument: listen port override.
    if let Some(arg) = std::env::args().nth(1) {
        let port: u16 = arg
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid port argument '{arg}'"))?;
        cfg.override_port(port);
    }

    cfg.print();

    let master = Master::new(cfg)?;
    master.run().await?;

    Ok(())
}
