use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use tracing::info;

use keywarden::access::StaticAccessControl;
use keywarden::logic::cipher::Aes256GcmCipher;
use keywarden::repository::{KeyRegistryLike, Repository, memory::InMemoryRegistry};
use keywarden::rootkey::{AwsKmsRootKeySource, LocalFileRootKeySource, RootKeySourceLike};
use keywarden::router::{WardenService, create_router};

#[derive(Args)]
pub struct ServeParams {
    /// Address to bind the HTTP listener to
    #[arg(long, default_value = "127.0.0.1:8999")]
    pub bind: SocketAddr,

    /// Path to the sqlite key registry; omit for a process-local in-memory registry
    #[arg(long)]
    pub registry_db: Option<PathBuf>,

    /// Access policy file (JSON: token -> granted (table, column) pairs)
    #[arg(long)]
    pub policy_file: PathBuf,

    /// Local root key file, created on first use when no KMS key is configured
    #[arg(long, default_value = ".keywarden/root-key")]
    pub root_key_file: PathBuf,

    /// KMS key ARN protecting the root key blob
    #[arg(long, requires = "kms_region", requires = "wrapped_root_key_file")]
    pub kms_key_arn: Option<String>,

    /// AWS region of the KMS key
    #[arg(long)]
    pub kms_region: Option<String>,

    /// File holding the KMS-wrapped root key blob produced by `init-root-key`
    #[arg(long)]
    pub wrapped_root_key_file: Option<PathBuf>,
}

pub async fn cmd_serve(params: ServeParams) -> Result<(), anyhow::Error> {
    let access = StaticAccessControl::from_path(&params.policy_file)
        .context("failed to load access policy")?;

    let root_source: Arc<dyn RootKeySourceLike> = match (
        &params.kms_key_arn,
        &params.kms_region,
        &params.wrapped_root_key_file,
    ) {
        (Some(arn), Some(region), Some(blob_path)) => {
            let blob = std::fs::read_to_string(blob_path)
                .context("failed to read wrapped root key blob")?;
            info!(key_arn = %arn, "using AWS KMS root key source");
            Arc::new(AwsKmsRootKeySource::new(
                arn.clone(),
                region.clone(),
                blob.trim().to_string(),
            ))
        }
        _ => {
            info!(path = %params.root_key_file.display(), "using local root key file");
            Arc::new(LocalFileRootKeySource::new(params.root_key_file.clone()))
        }
    };

    // The database handle must stay alive for as long as its connections.
    let mut _registry_db = None;
    let registry: Arc<dyn KeyRegistryLike> = match &params.registry_db {
        Some(path) => {
            let path = path.to_str().context("registry path is not valid UTF-8")?;
            let (db, repo) = Repository::connect(path).await?;
            _registry_db = Some(db);
            Arc::new(repo)
        }
        None => {
            info!("no registry database configured, using in-memory registry");
            Arc::new(InMemoryRegistry::new())
        }
    };

    let service = WardenService::new(
        Arc::new(access),
        root_source,
        registry,
        Arc::new(Aes256GcmCipher),
    );

    let (router, _openapi) = create_router().split_for_parts();
    let app = router.with_state(service);

    info!(bind = %params.bind, "starting keywarden server");
    let listener = tokio::net::TcpListener::bind(params.bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
