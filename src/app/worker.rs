use super::*;

impl App {
    /// Drains the reply channel without blocking. Returns true when any
    /// event was processed.
    pub(super) fn poll_worker(&mut self) -> bool {
        let Some(rx) = self.rx.clone() else {
            return false;
        };
        match rx.try_recv() {
            Ok(WorkerEvent::Reply(outcome)) => {
                self.finish_submission(outcome);
                true
            }
            Err(crossbeam_channel::TryRecvError::Empty) => false,
            Err(crossbeam_channel::TryRecvError::Disconnected) => {
                // The worker died without sending an outcome. Degrade to the
                // apology turn rather than leaving the placeholder behind.
                tracing::error!("reply worker disconnected before delivering an outcome");
                self.finish_submission(ReplyOutcome::Failure);
                true
            }
        }
    }

    /// Hides the typing affordance and resolves the placeholder into exactly
    /// one assistant turn per the outcome mapping.
    fn finish_submission(&mut self, outcome: ReplyOutcome) {
        let text = match outcome {
            ReplyOutcome::Text(reply) => {
                let cleaned = sanitize_reply_text(&reply);
                if cleaned.trim().is_empty() {
                    EMPTY_REPLY_MESSAGE.to_string()
                } else {
                    cleaned
                }
            }
            ReplyOutcome::Empty => EMPTY_REPLY_MESSAGE.to_string(),
            ReplyOutcome::Failure => FAILURE_MESSAGE.to_string(),
        };

        if let Some(idx) = self.assistant_idx {
            if let Some(entry) = self.entries.get_mut(idx) {
                entry.text = text;
            }
        }
        self.clear_running_state();
        self.last_status = "ready".to_string();
        self.follow_scroll();
    }

    #[cfg(test)]
    pub(super) fn begin_test_run(&mut self, rx: crossbeam_channel::Receiver<WorkerEvent>) {
        self.start_running_state(rx);
    }
}
