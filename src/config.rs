//! Service configuration.
//!
//! The host hands us one argument string of `key=value` lines:
//!
//! ```text
//! pipe=/data/user/0/app/cache/tagpipe
//! ```
//!
//! Only `pipe` is recognized. Unknown keys are ignored so the host can grow
//! new options without breaking older builds. Pool size and the LENGTH
//! bitrate threshold are fixed constants, not per-call settings.

use std::path::PathBuf;

use crate::error::{Result, ServiceError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub pipe_path: PathBuf,
}

impl ServiceConfig {
    pub fn new(pipe_path: impl Into<PathBuf>) -> Self {
        Self {
            pipe_path: pipe_path.into(),
        }
    }

    pub fn from_arg_string(args: &str) -> Result<Self> {
        let pipe_path = args
            .lines()
            .filter_map(|line| line.split_once('='))
            .filter(|(key, _)| key.trim() == "pipe")
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
            .last()
            .ok_or(ServiceError::MissingChannelPath)?;

        Ok(Self::new(pipe_path))
    }
}
