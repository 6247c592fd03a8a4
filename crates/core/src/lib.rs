//! s3deploy-core - Core library for the s3deploy CLI
//!
//! This library mirrors a local directory into an S3 bucket: it enumerates
//! local files, uploads them with an ACL and guessed content type, then
//! deletes remote objects that have no local counterpart.

pub mod config;
pub mod deploy;
pub mod error;
pub mod local;
pub mod store;

// Re-export commonly used types
pub use config::{get_config_path, load_config, load_config_file, resolve_config, validate_config};
pub use config::{ConfigFile, ConfigSources, DeployConfig, LoggingConfig, S3Config, DEFAULT_REGION};
pub use deploy::{DeploySummary, Deployer, UploadProgress};
pub use error::{Error, Result};
pub use local::{guess_content_type, scan_local_files, LocalFile};
pub use store::{ObjectStore, S3Store, UploadOptions};
