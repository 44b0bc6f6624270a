use std::io::Error as IoError;
use std::path::PathBuf;

use actix_web::ResponseError;
use actix_web::http::StatusCode;
use thiserror::Error;

/// Fatal startup errors. Each maps to its own process exit code.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("cannot read {}: {source}", .path.display())]
    ConfigRead { path: PathBuf, source: IoError },
    #[error("cannot parse {}: {source}", .path.display())]
    ConfigParse { path: PathBuf, source: serde_yaml::Error },
    #[error("cannot listen on {addr}: {source}")]
    Bind { addr: String, source: IoError },
    #[error("server stopped: {0}")]
    Serve(IoError),
    #[error("cannot start probes: {0:#}")]
    Checker(anyhow::Error),
    #[error("{0:#}")]
    Io(#[from] IoError),
}

impl AppError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ConfigRead { .. } => 3,
            Self::Bind { .. } | Self::Serve(_) => 4,
            Self::ConfigParse { .. } => 5,
            Self::Checker(_) | Self::Io(_) => 1,
        }
    }
}

/// Errors surfaced by request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("cannot encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}
