//! Availability guard for stored objects.
//!
//! Every restore and every probe checks the object's [`StorageStatus`]
//! before touching its bytes. An object outside its availability window
//! (not yet available, or expired) is refused with
//! [`AritegError::IllegalStatus`] naming the attempted operation.

use std::fmt;

use ariteg_types::{now_millis, AritegLink, StorageStatus};

use crate::error::{AritegError, AritegResult};

/// Operation a status check guards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Probe,
    Restore,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Probe => "probe",
            Operation::Restore => "restore",
        })
    }
}

/// Check `status` against the clock at `now` (UNIX millis).
pub fn check_at(
    operation: Operation,
    link: &AritegLink,
    status: StorageStatus,
    now: i64,
) -> AritegResult<()> {
    if status.is_readable_at(now) {
        Ok(())
    } else {
        Err(AritegError::IllegalStatus {
            operation,
            link: link.clone(),
            status,
        })
    }
}

/// Check `status` against the current wall clock.
pub fn check(operation: Operation, link: &AritegLink, status: StorageStatus) -> AritegResult<()> {
    check_at(operation, link, status, now_millis())
}
