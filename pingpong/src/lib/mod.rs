//! Welcome to `pingpong`!
//!
//! A small harness that watches cache lines bounce between cores. It
//! times the same tight write loop against four data layouts:
//!
//! 1. [`NaiveScalar`](layout::NaiveScalar): adjacent array slots, one per
//!     thread. Neighbours share cache lines (*false sharing*).
//! 2. [`AlignedScalar`](layout::AlignedScalar): same, but every slot owns
//!     its line.
//! 3. [`SpreadPair`](layout::SpreadPair): one pair hammered by every
//!     thread, its two fields pushed onto different lines.
//! 4. [`PackedPair`](layout::PackedPair): one pair hammered by every
//!     thread, both fields on the same line (*true sharing*).
//!
//! Each run releases all workers at once through a [`ThreadLatch`], times
//! them until the last one is joined, and repeats the run a fixed number of
//! times to get an average.

/// Imports, type aliases, errors ... in general
/// useful stuff that shall be needed in many places.
pub mod utils;

/// Cache-interference sizes, both the compile-time guesses
/// and whatever the running machine reports.
pub mod interference;

pub mod layout;

mod latch;

/// The code being sampled.
pub mod worker;

mod orchestrate;

pub mod trials;

/// Knobs and the top-level benchmark sequence.
pub mod driver;

pub use crate::latch::ThreadLatch;
pub use crate::orchestrate::{run_threads, TrialResult};
pub use crate::utils::{BenchError, ElapsedSecs, Result, UselessResult};
