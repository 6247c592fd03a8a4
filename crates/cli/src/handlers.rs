//! Command handlers for the s3deploy CLI

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use s3deploy_core::{DeployConfig, Deployer, S3Store};

/// Progress bar for the upload phase.
///
/// Hidden when log lines are printed, both write to stderr.
fn upload_progress_bar(len: u64, show: bool) -> Result<ProgressBar> {
    if !show {
        return Ok(ProgressBar::hidden());
    }

    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Uploading... [{pos}/{len}] {wide_bar:.cyan/blue}")?,
    );
    Ok(pb)
}

/// Upload the configured directory, then remove stale objects
pub async fn handle_deploy(config: DeployConfig, show_progress: bool) -> Result<()> {
    println!(
        "Deploying {} -> s3://{} ({})",
        config.upload_dir.display(),
        config.bucket,
        config.region
    );

    let store = S3Store::new(&config).await?;
    let deployer = Deployer::new(config.upload_dir.clone(), store)?;

    let pb = upload_progress_bar(deployer.files().len() as u64, show_progress)?;

    let uploaded = match deployer.upload(|p| pb.set_position(p.current as u64)).await {
        Ok(uploaded) => {
            pb.finish_and_clear();
            uploaded
        }
        Err(e) => {
            pb.abandon();
            return Err(e.into());
        }
    };

    println!("  ✅ Upload complete ({} files)", uploaded);

    let deleted = deployer
        .cleanup(|key| println!("Deleting {}", style(key).red()))
        .await?;

    if deleted.is_empty() {
        println!("  ✅ Bucket in sync, nothing to delete");
    } else {
        println!("  ✅ Removed {} stale object(s)", deleted.len());
    }

    Ok(())
}
