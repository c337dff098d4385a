pub mod game;

// ============================================================================
// Profiling Macros
// ============================================================================

/// Log a message once per simulated second when the `perf_stats` feature is enabled.
///
/// The first argument is anything with a `.0` tick field (normally `Res<SimTick>`).
/// Without `perf_stats` the macro expands to nothing and its arguments are not
/// evaluated.
///
/// ```ignore
/// profile_log!(tick, "Resolved {} volumes", volumes.len());
/// ```
#[macro_export]
#[cfg(feature = "perf_stats")]
macro_rules! profile_log {
    ($tick:expr, $($arg:tt)*) => {
        if $tick.0 % 60 == 0 {
            bevy::prelude::info!($($arg)*);
        }
    };
}

#[macro_export]
#[cfg(not(feature = "perf_stats"))]
macro_rules! profile_log {
    ($tick:expr, $($arg:tt)*) => {};
}
