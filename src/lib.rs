#![forbid(unsafe_code)]

//! Channel analytics toolkit: lists a YouTube channel's uploads, fetches
//! per-video statistics, and merges both into one analysis-ready dataset.
//! Comment retrieval and sentiment classification sit on top of the same
//! client handle.

pub mod api;
pub mod comments;
pub mod config;
pub mod dataset;
pub mod duration;
pub mod error;
pub mod lister;
pub mod logging;
pub mod sentiment;
pub mod stats;

#[cfg(test)]
mod test_support;
