//! Monotonic time source

/// Millisecond monotonic clock
///
/// Firmware implements this over the embassy time driver; tests use a
/// manually advanced clock.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed epoch (normally boot)
    fn now_ms(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}
