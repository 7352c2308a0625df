use std::io;
use thiserror::Error;

/// Problems with the invocation itself. Always reported before any device
/// or network I/O happens.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid model pattern '{pattern}': {source}")]
    InvalidModelPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid file pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid block size '{0}' (expected something like 512, 4M or 1kB)")]
    InvalidBlockSize(String),

    #[error("no input given (use -i)")]
    MissingInput,

    #[error("-n needs an input directory or pattern (use -i)")]
    NewestWithoutInput,

    #[error("invalid object store input '{0}' (expected mc://ALIAS/BUCKET/KEY)")]
    InvalidRemoteInput(String),

    #[error("failed to load configuration: {0}")]
    Layers(#[from] Box<figment::Error>),
}

#[derive(Error, Debug)]
pub enum SafeddError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0}")]
    ResourceUnavailable(String),

    #[error("no block devices found")]
    NoDevices,

    #[error("only one block device found ({0}); refusing to pick the sole device as a write target")]
    SoleDevice(String),

    #[error("{0} is not in the block device listing; refusing to write to it")]
    UnlistedDevice(String),

    #[error("missing dependency: '{0}' was not found")]
    MissingDependency(String),

    #[error("{device} failed the safety checks\n{diagnostic}")]
    ConstraintMismatch { device: String, diagnostic: String },

    #[error("aborted, nothing was written")]
    Declined,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
