/// Exit code for fatal configuration errors, unreadable CA bundles and failed single-shot checks.
pub const FATAL_EXIT_CODE: i32 = 1;

/// Exit code used when the crash simulator terminates the process.
pub const CRASH_EXIT_CODE: i32 = 1;

/// Logs the message at error level and terminates the process.
#[macro_export]
macro_rules! exit_err {
    ($code:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        {
            ::tracing::error!($fmt $(, $arg)*);
            ::std::process::exit($code);
        }
    };
}
