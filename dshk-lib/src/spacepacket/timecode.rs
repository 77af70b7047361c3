use hifitime::{Duration, Epoch};

use super::SecondaryHeader;

/// The cFS mission epoch, 2000-01-01T11:58:55.816 UTC, from which secondary header
/// times are counted.
#[must_use]
pub fn mission_epoch() -> Epoch {
    Epoch::from_gregorian_utc(2000, 1, 1, 11, 58, 55, 816_000_000)
}

impl SecondaryHeader {
    /// Convert to an [Epoch].
    ///
    /// `subseconds` is interpreted as milliseconds, matching the DS ground tools.
    #[must_use]
    pub fn epoch(&self) -> Epoch {
        let dur = Duration::compose(
            0,
            0,
            0,
            0,
            u64::from(self.seconds),
            u64::from(self.subseconds),
            0,
            0,
        );
        mission_epoch() + dur
    }
}
