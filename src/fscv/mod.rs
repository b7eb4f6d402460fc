//! FSCV series types.
//!
//! Three types extend `core:TimeSeries`:
//!
//! - [`FscvExcitationSeries`] - applied voltage waveform (1-D, volts)
//! - [`FscvResponseSeries`] - measured current per electrode (2-D, amperes),
//!   linked to its excitation waveform and a region of the electrode table
//! - [`FscvBackgroundSubtractedSeries`] - response with the background current
//!   removed, linked to the raw response
//!
//! Builders create validated [`SeriesInstance`](crate::series::SeriesInstance)s
//! of these types; the views read type-specific fields back from them.

mod builders;
mod views;
pub mod testing;

pub use builders::{BackgroundSubtractedBuilder, ExcitationBuilder, ResponseBuilder};
pub use views::{FscvBackgroundSubtractedSeries, FscvExcitationSeries, FscvResponseSeries};

use crate::schema::TypeKey;

/// Namespace of the FSCV types.
pub const NAMESPACE: &str = "ndx-fscv";
/// Version of the FSCV namespace.
pub const VERSION: &str = "0.1.0";

/// Type name of the applied voltage waveform.
pub const EXCITATION_SERIES: &str = "FSCVExcitationSeries";
/// Type name of the measured current.
pub const RESPONSE_SERIES: &str = "FSCVResponseSeries";
/// Type name of the background-subtracted current.
pub const BACKGROUND_SUBTRACTED_SERIES: &str = "FSCVBackgroundSubtractedSeries";

/// Key of the built-in excitation series type.
pub fn excitation_key() -> TypeKey {
    TypeKey::new(NAMESPACE, EXCITATION_SERIES, VERSION)
}

/// Key of the built-in response series type.
pub fn response_key() -> TypeKey {
    TypeKey::new(NAMESPACE, RESPONSE_SERIES, VERSION)
}

/// Key of the built-in background-subtracted series type.
pub fn background_key() -> TypeKey {
    TypeKey::new(NAMESPACE, BACKGROUND_SUBTRACTED_SERIES, VERSION)
}
