//! CPU time of the whole process, as the kernel accounts it.

use std::{ops::Sub, time::Duration};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CpuTime {
    pub user: Duration,
    pub system: Duration,
}

impl CpuTime {
    pub fn total(&self) -> Duration {
        self.user + self.system
    }
}

impl Sub for CpuTime {
    type Output = CpuTime;
    fn sub(self, rhs: Self) -> Self::Output {
        CpuTime {
            user: self.user.saturating_sub(rhs.user),
            system: self.system.saturating_sub(rhs.system),
        }
    }
}

/// user + system time of all threads so far, `None` if the OS won't tell
#[cfg(unix)]
pub fn usage() -> Option<CpuTime> {
    use std::mem::MaybeUninit;

    let mut usage = MaybeUninit::<libc::rusage>::zeroed();
    // SAFETY: getrusage only writes into the struct we hand it
    if unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) } != 0 {
        return None;
    }
    // SAFETY: initialized by the successful call above
    let usage = unsafe { usage.assume_init() };
    Some(CpuTime {
        user: from_timeval(usage.ru_utime),
        system: from_timeval(usage.ru_stime),
    })
}

#[cfg(not(unix))]
pub fn usage() -> Option<CpuTime> {
    None
}

#[cfg(unix)]
fn from_timeval(tv: libc::timeval) -> Duration {
    Duration::from_secs(tv.tv_sec as u64) + Duration::from_micros(tv.tv_usec as u64)
}
