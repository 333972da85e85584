//! Business logic services.

pub mod air_quality;
pub mod media;
pub mod passwords;
pub mod session;

pub use air_quality::{AqiClient, AqiError, AqiReading, AqiTier};
pub use media::MediaStorage;
pub use session::SessionManager;
