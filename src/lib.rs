//! Subgen - Batch Subtitle Generation
//!
//! Batch-generates SRT subtitle files from video/audio sources using an
//! external speech-recognition engine, optionally machine-translating the
//! recognized text into another language.

pub mod batch;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod media;
pub mod progress;
pub mod subtitle;
pub mod translate;
