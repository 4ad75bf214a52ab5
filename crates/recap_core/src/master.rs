use std::sync::Arc;

use recap_config::RecapConfig;
use recap_proxy::Proxy;
use tokio::{net::TcpListener, sync::Semaphore};
use tracing::{error, info, instrument, warn};

use crate::worker::handle_connection;

pub struct Master {
    cfg: Arc<RecapConfig>,
    proxy: Arc<Proxy>,
}

impl Master {
    pub fn new(cfg: RecapConfig) -> anyhow::Result<Self> {
        let proxy = Arc::new(Proxy::new(&cfg)?);
        Ok(Self {
            cfg: Arc::new(cfg),
            proxy,
        })
    }

    /// Starts the master: binds the configured listener and runs the accept loop.
    #[instrument(skip(self), fields(listen = %self.cfg.server.listen))]
    pub async fn run(self) -> anyhow::Result<()> {
        let listen_addr = self.cfg.server.listen.clone();

        let listener = match TcpListener::bind(&listen_addr).await {
            Ok(l) => {
                info!(
                    target: "recap::master",
                    listen = %listen_addr,
                    "Bind() successful"
                );
                l
            }
            Err(e) => {
                error!(
                    target: "recap::master",
                    listen = %listen_addr,
                    error = ?e,
                    "Failed to bind listener"
                );
                return Err(e.into());
            }
        };

        self.run_on(listener).await
    }

    /// Accept loop over an already-bound listener. Split out so tests can
    /// bind an ephemeral port themselves.
    pub async fn run_on(self, listener: TcpListener) -> anyhow::Result<()> {
        info!(
            target: "recap::master",
            cache_dir = %self.proxy.store().root().display(),
            "Starting RECAP MASTER"
        );

        // Global limit for concurrent connections across the entire process
        let max_conns = self.cfg.global.max_connections as usize;
        let semaphore = Arc::new(Semaphore::new(max_conns));

        info!(
            target: "recap::master",
            max_conns,
            "Global connection semaphore initialized"
        );

        loop {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(p) => p,
                Err(_) => break,
            };

            let (stream, client_addr) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(
                        target: "recap::master",
                        error = ?e,
                        "Failed to accept connection"
                    );
                    continue;
                }
            };

            let proxy = self.proxy.clone();
            let cfg = self.cfg.clone();

            tokio::spawn(async move {
                let _permit = permit;
                if let Err(e) = handle_connection(stream, client_addr, proxy, cfg).await {
                    warn!(
                        target: "recap::worker",
                        client = %client_addr,
                        error = ?e,
                        "Connection handler failed"
                    );
                }
            });
        }

        Ok(())
    }
}
