#![forbid(unsafe_code)]

//! Log macros.
//!
//! With the `tracing` feature the core logs through [`tracing`]: phase
//! changes at `info`, gesture switches and focus changes at `debug`,
//! rejected frames at `warn`, per-frame classification at `trace`. Without
//! it the same macros compile to nothing, so call sites stay unguarded:
//!
//! ```
//! bloom_core::debug!(gesture = "open", "asserted gesture changed");
//! ```

#[cfg(feature = "tracing")]
pub use tracing::{debug, info, trace, warn};

#[cfg(not(feature = "tracing"))]
mod disabled {
    /// Discards its arguments (`tracing` feature off).
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }

    /// Discards its arguments (`tracing` feature off).
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// Discards its arguments (`tracing` feature off).
    #[macro_export]
    macro_rules! info {
        ($($arg:tt)*) => {};
    }

    /// Discards its arguments (`tracing` feature off).
    #[macro_export]
    macro_rules! warn {
        ($($arg:tt)*) => {};
    }
}
