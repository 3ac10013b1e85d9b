//! Hooks into the presentation layer.

/// Receives user-facing feedback from the interaction controller.
pub trait Presenter {
    /// Show a transient, dismissible error notification.
    fn report_error(&mut self, message: &str);

    /// Show or hide the busy indicator while registry calls are in flight.
    fn set_busy(&mut self, busy: bool);
}

/// Presenter that only writes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn report_error(&mut self, message: &str) {
        log::error!("{}", message);
    }

    fn set_busy(&mut self, busy: bool) {
        log::debug!("busy: {}", busy);
    }
}

impl<P: Presenter + ?Sized> Presenter for &mut P {
    fn report_error(&mut self, message: &str) {
        (**self).report_error(message);
    }

    fn set_busy(&mut self, busy: bool) {
        (**self).set_busy(busy);
    }
}
