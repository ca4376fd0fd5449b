use std::path::PathBuf;

use clap::Args;

use keywarden::rootkey::AwsKmsRootKeySource;

#[derive(Args)]
pub struct InitRootKeyParams {
    /// KMS key ARN that will protect the root key
    #[arg(long)]
    pub kms_key_arn: String,

    /// AWS region of the KMS key
    #[arg(long)]
    pub kms_region: String,

    /// Where to write the wrapped root key blob
    #[arg(long, default_value = ".keywarden/root-key.kms")]
    pub output: PathBuf,
}

pub async fn cmd_init_root_key(params: InitRootKeyParams) -> Result<(), anyhow::Error> {
    let blob = AwsKmsRootKeySource::provision(&params.kms_key_arn, &params.kms_region).await?;

    if let Some(parent) = params.output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&params.output, &blob)?;

    println!("wrote wrapped root key blob to {}", params.output.display());
    Ok(())
}
