/// Latches the first "begin climb" signal and swallows the rest.
#[derive(Debug, Clone, Default)]
pub struct ClimbTrigger {
    fired_at_ms: Option<f64>,
}

impl ClimbTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the trigger time the first time it is called, `None` afterwards.
    pub fn fire(&mut self, now_ms: f64) -> Option<f64> {
        if self.fired_at_ms.is_some() {
            tracing::trace!(now_ms, "climb trigger already used");
            return None;
        }
        self.fired_at_ms = Some(now_ms);
        Some(now_ms)
    }

    pub fn fired_at(&self) -> Option<f64> {
        self.fired_at_ms
    }

    pub fn has_fired(&self) -> bool {
        self.fired_at_ms.is_some()
    }
}
