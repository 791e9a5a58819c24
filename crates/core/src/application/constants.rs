// Runner constants (no magic values)

/// Exit status for setup failures: missing project dir, failed activation, unusable log dir
pub const SETUP_FAILURE_EXIT_CODE: i32 = 1;

/// Exit status when the entry point cannot be started (same as a shell's "command not found")
pub const SPAWN_FAILURE_EXIT_CODE: i32 = 127;

/// Offset added to a terminating signal number, as shells report it
pub const SIGNAL_EXIT_CODE_BASE: i32 = 128;

/// Width of the `=` rule framing banners
pub const BANNER_WIDTH: usize = 60;

/// Human-readable timestamp used inside banners
pub const BANNER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
