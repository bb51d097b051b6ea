use std::io::{Error, Result};

#[cfg(all(unix, not(target_os = "android")))]
use libc::{rlimit, rlim_t, RLIMIT_NOFILE};

/// Set nofile limits, soft and hard alike.
///
/// Raising the hard limit requires `CAP_SYS_RESOURCE`.
#[cfg(all(unix, not(target_os = "android")))]
pub fn set_nofile_limit(nofile: u64) -> Result<()> {
    let lim = rlimit {
        rlim_cur: nofile as rlim_t,
        rlim_max: nofile as rlim_t,
    };

    if unsafe { libc::setrlimit(RLIMIT_NOFILE, &lim as *const _) } < 0 {
        Err(Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Get current (soft, hard) nofile limits.
#[cfg(all(unix, not(target_os = "android")))]
pub fn get_nofile_limit() -> Result<(u64, u64)> {
    let mut lim = rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };

    if unsafe { libc::getrlimit(RLIMIT_NOFILE, &mut lim as *mut _) } < 0 {
        Err(Error::last_os_error())
    } else {
        Ok((lim.rlim_cur as u64, lim.rlim_max as u64))
    }
}

/// Raise the soft limit up to the hard limit.
#[cfg(all(unix, not(target_os = "android")))]
pub fn bump_nofile_limit() -> Result<()> {
    let (cur, max) = get_nofile_limit()?;
    if cur < max {
        set_nofile_limit(max)?;
    }
    Ok(())
}

/// Whether an `accept` or `socket` error means the process ran out of
/// descriptors or kernel memory, which clears up once connections close.
pub fn is_resource_exhausted(e: &Error) -> bool {
    #[cfg(unix)]
    {
        matches!(
            e.raw_os_error(),
            Some(libc::EMFILE | libc::ENFILE | libc::ENOBUFS | libc::ENOMEM)
        )
    }

    #[cfg(not(unix))]
    {
        let _ = e;
        false
    }
}

#[cfg(all(test, unix, not(target_os = "android")))]
mod tests {
    use super::*;

    #[test]
    fn soft_never_exceeds_hard() {
        let (cur, max) = get_nofile_limit().unwrap();
        assert!(cur <= max);
    }

    #[test]
    fn exhaustion_errors() {
        assert!(is_resource_exhausted(&Error::from_raw_os_error(libc::EMFILE)));
        assert!(!is_resource_exhausted(&Error::from_raw_os_error(libc::ECONNRESET)));
    }
}
