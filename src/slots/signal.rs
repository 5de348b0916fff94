use super::OwnerSignal;
use crate::error::SlotError;
use std::io;

/// Sends SIGTERM to slot owners.
#[derive(Debug, Clone, Copy, Default)]
pub struct SigtermSignal;

impl OwnerSignal for SigtermSignal {
    #[cfg(unix)]
    fn terminate(&self, pid: u32) -> Result<(), SlotError> {
        // pid 0 and negative values address process groups.
        let raw = libc::pid_t::try_from(pid)
            .ok()
            .filter(|raw| *raw > 0)
            .ok_or_else(|| SlotError::Signal {
                pid,
                source: io::Error::from(io::ErrorKind::InvalidInput),
            })?;

        // SAFETY: kill(2) takes plain integers and touches no memory we own.
        let rc = unsafe { libc::kill(raw, libc::SIGTERM) };
        if rc == -1 {
            return Err(SlotError::Signal {
                pid,
                source: io::Error::last_os_error(),
            });
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn terminate(&self, pid: u32) -> Result<(), SlotError> {
        Err(SlotError::Signal {
            pid,
            source: io::Error::from(io::ErrorKind::Unsupported),
        })
    }
}
