//! Progress reporting for the YAML loader and the validator.

/// One step of a long-running operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// What is running, e.g. "Loading YAML" or "Validating".
    pub stage_description: String,
    /// Steps completed so far in this stage.
    pub current_item: u64,
    pub total_items: Option<u64>,
    /// The file or check about to be processed.
    pub message: Option<String>,
}

/// Receives every [`ProgressUpdate`]. The return value is ignored; the
/// operations report progress but cannot be cancelled.
pub type ProgressCallback = Box<dyn FnMut(ProgressUpdate) -> bool + Send + Sync>;

/// Counts the steps of one stage and forwards them to an optional callback.
pub(crate) struct StageProgress<'a> {
    callback: Option<&'a mut ProgressCallback>,
    stage: &'static str,
    total: u64,
    done: u64,
}

impl<'a> StageProgress<'a> {
    pub(crate) fn new(callback: Option<&'a mut ProgressCallback>, stage: &'static str, total: u64) -> Self {
        StageProgress {
            callback,
            stage,
            total,
            done: 0,
        }
    }

    /// Reports the step about to run, then counts it as done.
    pub(crate) fn step(&mut self, message: impl Into<String>) {
        if let Some(cb) = self.callback.as_mut() {
            cb(ProgressUpdate {
                stage_description: self.stage.to_string(),
                current_item: self.done,
                total_items: Some(self.total),
                message: Some(message.into()),
            });
        }
        self.done += 1;
    }

    /// Reports the stage as complete.
    pub(crate) fn finish(&mut self) {
        if let Some(cb) = self.callback.as_mut() {
            cb(ProgressUpdate {
                stage_description: self.stage.to_string(),
                current_item: self.total,
                total_items: Some(self.total),
                message: None,
            });
        }
    }
}
