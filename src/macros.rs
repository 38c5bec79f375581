/// Runs the given statements only when the `logging` feature is enabled.
///
/// This lets call sites use `log::debug!` and friends without sprinkling
/// `#[cfg(feature = "logging")]` everywhere.
macro_rules! log {
    ($($tt:tt)*) => {
        #[cfg(feature = "logging")]
        {
            $($tt)*
        }
    }
}
