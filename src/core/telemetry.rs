//! Tracing setup for hosts embedding the client

/// Install the fmt subscriber.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init() {
    if tracing_subscriber::fmt().try_init().is_err() {
        tracing::trace!("Tracing subscriber already installed");
    }
}
