//! s3link server - upload objects to S3 and hand out presigned download URLs.
//!
//! # Usage
//!
//! ```text
//! S3_BUCKET=my-bucket S3_REGION=us-east-1 \
//! S3_ACCESS_KEY=... S3_SECRET_KEY=... s3link-server
//! ```
//!
//! # Environment Variables
//!
//! Variables unset in the process environment are read from a `.env` file in
//! the working directory, if one exists.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `S3_BUCKET` | *(required)* | Target bucket |
//! | `S3_REGION` | *(required)* | Bucket region |
//! | `S3_ACCESS_KEY` | *(required)* | Access key ID |
//! | `S3_SECRET_KEY` | *(required)* | Secret access key |
//! | `GATEWAY_LISTEN` | `0.0.0.0` | Bind host |
//! | `SERVER_PORT` | `8080` | Bind port |
//! | `S3_ENDPOINT_URL` | *(unset)* | Custom path-style endpoint |
//! | `S3_REQUEST_TIMEOUT_SECS` | *(unset)* | Upload request timeout |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use s3link_core::{ObjectStore, S3LinkConfig, StorageClient};
use s3link_http::service::{HEALTH_PATH, S3LinkHttpService};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve<S: ObjectStore>(listener: TcpListener, service: S3LinkHttpService<S>) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Query the local health endpoint. Used as a container health check.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request =
        format!("GET {HEALTH_PATH} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"status\":\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

/// Address a local health check should connect to.
fn health_check_addr(config: &S3LinkConfig) -> String {
    config.listen_addr().replace("0.0.0.0", "127.0.0.1")
}

#[tokio::main]
async fn main() -> Result<()> {
    let config =
        S3LinkConfig::from_env_and_dotenv(".env").context("failed to load configuration")?;

    if std::env::args().any(|a| a == "--health-check") {
        let healthy = run_health_check(&health_check_addr(&config)).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    init_tracing(&config.log_level)?;

    info!(
        listen = %config.listen_addr(),
        bucket = %config.bucket,
        region = %config.region,
        endpoint_url = ?config.endpoint_url,
        version = VERSION,
        "starting s3link server",
    );

    let client = StorageClient::from_config(&config).context("failed to build storage client")?;
    let service = S3LinkHttpService::new(client);

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(addr = %addr, "listening for connections");

    serve(listener, service).await
}
