//! Sampled frame settings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default sampled frame width.
pub const DEFAULT_FRAME_WIDTH: u32 = 1920;
/// Default sampled frame height.
pub const DEFAULT_FRAME_HEIGHT: u32 = 1080;
/// Image extension for sampled frames.
pub const FRAME_EXTENSION: &str = "png";

/// Output resolution for sampled frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: DEFAULT_FRAME_WIDTH,
            height: DEFAULT_FRAME_HEIGHT,
        }
    }
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// FFmpeg scale filter for this resolution.
    pub fn scale_filter(&self) -> String {
        format!("scale={}:{}", self.width, self.height)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = ResolutionError;

    /// Parse `WIDTHxHEIGHT`, e.g. `1920x1080`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| ResolutionError(s.to_string()))?;
        let width: u32 = w.trim().parse().map_err(|_| ResolutionError(s.to_string()))?;
        let height: u32 = h.trim().parse().map_err(|_| ResolutionError(s.to_string()))?;
        if width == 0 || height == 0 {
            return Err(ResolutionError(s.to_string()));
        }
        Ok(Self { width, height })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid resolution '{0}'. Use WIDTHxHEIGHT, e.g. 1920x1080")]
pub struct ResolutionError(String);
