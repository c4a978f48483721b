/// Coalesces reflow requests to at most one run per animation frame.
///
/// Requests only mark work as pending; the run happens on the next frame
/// (trailing edge), however many requests arrived in between.
#[derive(Debug, Default, Clone)]
pub struct FrameScheduler {
    pending: bool,
    coalesced: u64,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a run on the next frame. Returns false when one was already
    /// pending and this request got merged into it.
    pub fn request(&mut self) -> bool {
        if self.pending {
            self.coalesced = self.coalesced.saturating_add(1);
            return false;
        }
        self.pending = true;
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Called once per frame. True when the pending run should happen now.
    pub fn take_due(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn cancel(&mut self) {
        self.pending = false;
    }

    /// Requests merged into an already pending run so far.
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}
