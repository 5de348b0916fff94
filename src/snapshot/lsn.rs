use serde::{Deserialize, Serialize};
use std::fmt;

/// Position in the write-ahead log.
///
/// Formatted the way the server prints it: upper and lower 32 bits in
/// upper-case hex separated by a slash.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Lsn(pub u64);

impl Lsn {
    pub const INVALID: Lsn = Lsn(0);

    pub const fn from_parts(hi: u32, lo: u32) -> Self {
        Self(((hi as u64) << 32) | lo as u64)
    }

    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }

    #[allow(clippy::cast_possible_truncation)]
    pub const fn hi(self) -> u32 {
        (self.0 >> 32) as u32
    }

    #[allow(clippy::cast_possible_truncation)]
    pub const fn lo(self) -> u32 {
        self.0 as u32
    }
}

impl From<u64> for Lsn {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Lsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}/{:X}", self.hi(), self.lo())
    }
}
