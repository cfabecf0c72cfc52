//! Synchronous progress reporting.

/// Observer notified as a pipeline stage advances.
///
/// Purely observational: implementations must not fail the pipeline.
pub trait ProgressObserver {
    fn on_progress(&self, phase: &str, current: usize, total: usize);
}

impl<F> ProgressObserver for F
where
    F: Fn(&str, usize, usize),
{
    fn on_progress(&self, phase: &str, current: usize, total: usize) {
        self(phase, current, total)
    }
}

/// Report to an optional observer.
pub fn report(observer: Option<&dyn ProgressObserver>, phase: &str, current: usize, total: usize) {
    if let Some(obs) = observer {
        obs.on_progress(phase, current, total);
    }
}
