// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// localconvert-session — Asynchronous orchestration for the LocalConvert engine.
//
// Owns the single-active-job conversion pipeline, the progress ticker, and
// the merge session (loaded sources, ordered page list, previews, last
// merged artifact). Progress is published through `tokio::sync::watch`.

pub mod job;
pub mod merge_queue;
pub mod merge_session;
pub mod pipeline;
pub mod progress;

#[cfg(test)]
pub(crate) mod test_support;

pub use job::{JobOutcome, JobSnapshot, JobState, JobTicket};
pub use merge_queue::{LoadedSource, MergeQueue, SourceSummary};
pub use merge_session::{LoadFailure, LoadReport, MergeSession, SessionOverview, merged_file_name};
pub use pipeline::ConversionPipeline;
pub use progress::ProgressTicker;
