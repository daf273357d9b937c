//! UI Layer Abstractions
//!
//! Callbacks the host UI implements to receive signals from the core.

/// Receives the "leave performance mode" request raised by the navigator.
///
/// Called synchronously from the navigator's key handling, so implementations
/// should only record the request (flip a flag, post a message) and return.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::ui::ExitSignal;
///
/// struct CloseOverlay(std::sync::mpsc::Sender<()>);
///
/// impl ExitSignal for CloseOverlay {
///     fn exit_requested(&self) {
///         let _ = self.0.send(());
///     }
/// }
/// ```
pub trait ExitSignal: Send + Sync {
    fn exit_requested(&self);
}

/// Exit signal that discards every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopExitSignal;

impl ExitSignal for NoopExitSignal {
    fn exit_requested(&self) {}
}
