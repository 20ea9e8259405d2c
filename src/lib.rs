#![recursion_limit = "256"]

//! LSTM sentiment classification of pre-indexed movie reviews with Burn.
//!
//! Layers, outermost first:
//!   1. `cli`         — clap commands
//!   2. `application` — train / evaluate / predict use cases
//!   3. `domain`      — reviews, labels, the `ReviewSource` trait
//!   4. `data`        — providers, preprocessing, datasets, batching
//!   5. `ml`          — stage stacks, model, training, evaluation
//!   6. `infra`       — checkpoints and metrics

pub mod cli;
pub mod application;
pub mod domain;
pub mod data;
pub mod ml;
pub mod infra;
pub mod error;
