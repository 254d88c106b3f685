#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for sampling still frames from source videos.
//!
//! This crate provides:
//! - Typed single-frame FFmpeg invocations
//! - A runner with timeout support via tokio
//! - The [`FrameCapture`] seam and its FFmpeg implementation
//! - Report directory preparation and cleanup

pub mod command;
pub mod error;
pub mod frame;
pub mod fs_utils;

pub use command::{locate_ffmpeg, FfmpegRunner, FrameGrab};
pub use error::{MediaError, MediaResult};
pub use frame::{CaptureRequest, FfmpegFrameCapture, FrameCapture};
pub use fs_utils::{clean_directory, ensure_directory, DirectoryCleaner, OutputCleaner};
