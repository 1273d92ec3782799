//! Panel error types
//!
//! Only two things ever leave a widget callback: loss of the display
//! connection, and a theme the widget refuses to be built from. Everything
//! else (missing properties, windows that vanished mid-request) is absorbed
//! by the property service.

use thiserror::Error;
use x11rb::errors::ConnectionError;

#[derive(Debug, Error)]
pub enum PanelError {
    /// The display connection is gone; the event loop terminates.
    #[error("connection to the X server lost: {0}")]
    ConnectionLost(#[from] ConnectionError),

    /// Widget construction rejected its theme data.
    #[error("invalid theme for {widget}: {reason}")]
    Theme { widget: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, PanelError>;
