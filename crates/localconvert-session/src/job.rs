// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Job state machine — Idle -> Running -> Succeeded | Failed, with a
// generation token that lets a newer job supersede an older one.

use std::sync::Arc;

use localconvert_core::{ConvertError, ConvertedArtifact};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::progress::advance;

/// Highest progress a running job can show; 100 only comes with success.
pub const RUNNING_PROGRESS_MAX: u8 = 99;

/// Lifecycle state of the session's single job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// Everything an observer needs to draw the job: published as one value so
/// state, progress and result never disagree.
#[derive(Debug, Clone, Default)]
pub struct JobSnapshot {
    /// Incremented whenever a job starts or the session resets.
    pub generation: u64,
    pub state: JobState,
    /// 0-100. Monotonic within one generation.
    pub progress: u8,
    pub artifact: Option<Arc<ConvertedArtifact>>,
    pub failure: Option<ConvertError>,
}

impl JobSnapshot {
    pub fn is_running(&self) -> bool {
        self.state == JobState::Running
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, JobState::Succeeded | JobState::Failed)
    }

    /// Begin a new job, invalidating any earlier one. Returns its generation.
    pub(crate) fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.state = JobState::Running;
        self.progress = 0;
        self.artifact = None;
        self.failure = None;
        self.generation
    }

    /// Apply one progress tick. Ignored unless `generation` is current and
    /// the job is still running. Returns whether anything changed.
    pub(crate) fn tick(&mut self, generation: u64, step: u8, ceiling: u8) -> bool {
        if self.generation != generation || !self.is_running() {
            return false;
        }
        self.raise_to(advance(self.progress, step, ceiling.min(RUNNING_PROGRESS_MAX)))
    }

    /// Raise progress to `value` if that is higher, capped below 100.
    /// Same guards as `tick`.
    pub(crate) fn report(&mut self, generation: u64, value: u8) -> bool {
        if self.generation != generation || !self.is_running() {
            return false;
        }
        self.raise_to(value.min(RUNNING_PROGRESS_MAX))
    }

    fn raise_to(&mut self, value: u8) -> bool {
        if value > self.progress {
            self.progress = value;
            true
        } else {
            false
        }
    }

    /// Finish with success: progress snaps to 100 in the same update.
    pub(crate) fn succeed(&mut self, generation: u64, artifact: Option<Arc<ConvertedArtifact>>) -> bool {
        if self.generation != generation || !self.is_running() {
            return false;
        }
        self.state = JobState::Succeeded;
        self.progress = 100;
        self.artifact = artifact;
        self.failure = None;
        true
    }

    /// Finish with failure, dropping any artifact.
    pub(crate) fn fail(&mut self, generation: u64, error: ConvertError) -> bool {
        if self.generation != generation || !self.is_running() {
            return false;
        }
        self.state = JobState::Failed;
        self.artifact = None;
        self.failure = Some(error);
        true
    }

    /// Back to Idle with progress 0. Anything still in flight becomes stale.
    pub(crate) fn reset(&mut self) {
        self.generation += 1;
        self.state = JobState::Idle;
        self.progress = 0;
        self.artifact = None;
        self.failure = None;
    }
}

/// How a job ended, from the point of view of whoever started it.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Completed(Arc<ConvertedArtifact>),
    Failed(ConvertError),
    /// A newer job or a reset took over before this one finished.
    Superseded,
}

impl JobOutcome {
    pub fn artifact(&self) -> Option<&Arc<ConvertedArtifact>> {
        match self {
            Self::Completed(artifact) => Some(artifact),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ConvertError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Handle to a started job.
#[derive(Debug)]
pub struct JobTicket {
    generation: u64,
    handle: JoinHandle<JobOutcome>,
}

impl JobTicket {
    pub(crate) fn new(generation: u64, handle: JoinHandle<JobOutcome>) -> Self {
        Self { generation, handle }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait for the job to end.
    pub async fn wait(self) -> JobOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(err) if err.is_cancelled() => JobOutcome::Superseded,
            Err(err) => JobOutcome::Failed(ConvertError::Internal(format!("job task failed: {err}"))),
        }
    }
}
