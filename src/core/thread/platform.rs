/*!
 * Platform Thread Glue
 *
 * The only place OS-specific thread calls live. Every operation here is a
 * best-effort hint: failures come back as `ThreadError` for the caller to
 * downgrade to a warning.
 */

use crate::core::errors::{ThreadError, ThreadResult};
#[cfg(any(target_os = "linux", target_os = "macos"))]
use std::ffi::CString;
use std::thread::JoinHandle;

/// Strip interior NUL bytes, which neither std nor pthreads accept
pub(crate) fn sanitize_name(name: &str) -> String {
    name.chars().filter(|c| *c != '\0').collect()
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
fn c_name(name: &str) -> ThreadResult<CString> {
    CString::new(name).map_err(|e| ThreadError::NameRejected {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
fn check_name_rc(rc: i32, name: &str) -> ThreadResult<()> {
    if rc == 0 {
        Ok(())
    } else {
        Err(ThreadError::NameRejected {
            name: name.to_string(),
            reason: std::io::Error::from_raw_os_error(rc).to_string(),
        })
    }
}

#[cfg(target_os = "linux")]
mod imp {
    use super::*;
    use nix::libc;
    use nix::sched::{sched_setaffinity, CpuSet};
    use nix::unistd::Pid;
    use std::os::unix::thread::JoinHandleExt;

    pub fn set_current_thread_name(name: &str) -> ThreadResult<()> {
        let cname = c_name(name)?;
        // SAFETY: pthread_self is always valid; cname outlives the call.
        let rc = unsafe { libc::pthread_setname_np(libc::pthread_self(), cname.as_ptr()) };
        check_name_rc(rc, name)
    }

    pub fn set_thread_name<T>(handle: &JoinHandle<T>, name: &str) -> ThreadResult<()> {
        let cname = c_name(name)?;
        // SAFETY: the JoinHandle keeps the pthread joinable, so the id is
        // valid for the duration of the call.
        let thread = handle.as_pthread_t() as libc::pthread_t;
        let rc = unsafe { libc::pthread_setname_np(thread, cname.as_ptr()) };
        check_name_rc(rc, name)
    }

    pub fn set_current_thread_affinity(core: u16) -> ThreadResult<()> {
        let rejected = |reason: String| ThreadError::AffinityRejected { core, reason };

        let mut set = CpuSet::new();
        set.set(usize::from(core)).map_err(|e| rejected(e.to_string()))?;
        // Pid 0 targets the calling thread
        sched_setaffinity(Pid::from_raw(0), &set).map_err(|e| rejected(e.to_string()))
    }
}

#[cfg(target_os = "macos")]
mod imp {
    use super::*;
    use nix::libc;

    pub fn set_current_thread_name(name: &str) -> ThreadResult<()> {
        let cname = c_name(name)?;
        // SAFETY: cname outlives the call.
        let rc = unsafe { libc::pthread_setname_np(cname.as_ptr()) };
        check_name_rc(rc, name)
    }

    pub fn set_thread_name<T>(_handle: &JoinHandle<T>, name: &str) -> ThreadResult<()> {
        Err(ThreadError::Unsupported(format!(
            "renaming another thread ('{name}') on macOS"
        )))
    }

    pub fn set_current_thread_affinity(core: u16) -> ThreadResult<()> {
        Err(ThreadError::Unsupported(format!("pinning to core {core} on macOS")))
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
mod imp {
    use super::*;

    pub fn set_current_thread_name(name: &str) -> ThreadResult<()> {
        Err(ThreadError::Unsupported(format!("naming thread '{name}'")))
    }

    pub fn set_thread_name<T>(_handle: &JoinHandle<T>, name: &str) -> ThreadResult<()> {
        Err(ThreadError::Unsupported(format!("naming thread '{name}'")))
    }

    pub fn set_current_thread_affinity(core: u16) -> ThreadResult<()> {
        Err(ThreadError::Unsupported(format!("pinning to core {core}")))
    }
}

pub(crate) use imp::{set_current_thread_affinity, set_current_thread_name, set_thread_name};
