// default logfile
pub const DEFAULT_LOG_FILE: &str = "stdout";

// time allowed for live sessions to hang up on shutdown
pub const SHUTDOWN_GRACE_MS: u64 = 500;
