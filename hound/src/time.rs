/*! Time structures.

The `time` module contains structures used to represent both absolute and relative time of
captured packets.

 - [Instant] is used to represent the absolute capture time of a packet.
 - [Duration] is used to represent relative time, such as a round-trip time.

[Instant]: struct.Instant.html
[Duration]: struct.Duration.html
*/
use core::{fmt, ops};
pub use core::time::Duration;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// A representation of an absolute capture time.
///
/// The `Instant` type is a wrapper around a `i64` value that represents a number of nanoseconds
/// since the unix epoch, which is what capture files record.
///
/// * A value less than `0` indicates a time before the epoch. Some broken capture files contain
///   these and the arithmetic stays well-defined.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Instant {
    pub nanos: i64,
}

impl Instant {
    /// Create a new `Instant` from a number of nanoseconds.
    pub fn from_nanos<T: Into<i64>>(nanos: T) -> Instant {
        Instant { nanos: nanos.into() }
    }

    /// Create a new `Instant` from a number of microseconds.
    pub fn from_micros<T: Into<i64>>(micros: T) -> Instant {
        Instant { nanos: micros.into() * 1_000 }
    }

    /// Create a new `Instant` from a number of milliseconds.
    pub fn from_millis<T: Into<i64>>(millis: T) -> Instant {
        Instant { nanos: millis.into() * 1_000_000 }
    }

    /// Create a new `Instant` from a number of seconds.
    pub fn from_secs<T: Into<i64>>(secs: T) -> Instant {
        Instant { nanos: secs.into() * NANOS_PER_SEC }
    }

    /// Create a new `Instant` from the two fields of a capture record header.
    pub fn from_parts(secs: u32, subsec_nanos: u32) -> Instant {
        Instant { nanos: i64::from(secs) * NANOS_PER_SEC + i64::from(subsec_nanos) }
    }

    /// Create a new `Instant` from the current [std::time::SystemTime].
    ///
    /// [std::time::SystemTime]: https://doc.rust-lang.org/std/time/struct.SystemTime.html
    pub fn now() -> Instant {
        Self::from(::std::time::SystemTime::now())
    }

    /// The number of whole seconds that have passed since the epoch.
    pub fn secs(&self) -> i64 {
        self.nanos.div_euclid(NANOS_PER_SEC)
    }

    /// The fractional number of nanoseconds within the current second.
    pub fn subsec_nanos(&self) -> u32 {
        self.nanos.rem_euclid(NANOS_PER_SEC) as u32
    }

    /// The fractional number of microseconds within the current second.
    pub fn subsec_micros(&self) -> u32 {
        self.subsec_nanos() / 1_000
    }

    /// The total number of nanoseconds that have passed since the epoch.
    pub fn total_nanos(&self) -> i64 {
        self.nanos
    }

    /// The time elapsed from `earlier` to `self`.
    ///
    /// Returns `None` if `earlier` is actually later than `self`. Captures are time-ordered in
    /// principle but the capture clock may still step backwards.
    pub fn checked_duration_since(&self, earlier: Instant) -> Option<Duration> {
        let delta = self.nanos.checked_sub(earlier.nanos)?;
        if delta < 0 {
            None
        } else {
            Some(Duration::from_nanos(delta as u64))
        }
    }
}

impl From<::std::time::SystemTime> for Instant {
    fn from(other: ::std::time::SystemTime) -> Instant {
        match other.duration_since(::std::time::UNIX_EPOCH) {
            Ok(n) => Instant { nanos: n.as_nanos() as i64 },
            Err(err) => {
                let n = err.duration();
                Instant { nanos: -(n.as_nanos() as i64) }
            }
        }
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{:06}s", self.secs(), self.subsec_micros())
    }
}

impl ops::Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, rhs: Duration) -> Instant {
        Instant::from_nanos(self.nanos + rhs.as_nanos() as i64)
    }
}

impl ops::Sub<Duration> for Instant {
    type Output = Instant;

    fn sub(self, rhs: Duration) -> Instant {
        Instant::from_nanos(self.nanos - rhs.as_nanos() as i64)
    }
}

impl ops::Sub<Instant> for Instant {
    type Output = Duration;

    fn sub(self, rhs: Instant) -> Duration {
        Duration::from_nanos((self.nanos - rhs.nanos).unsigned_abs())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_instant_ops() {
        assert_eq!(Instant::from_millis(4) + Duration::from_millis(6), Instant::from_millis(10));
        assert_eq!(Instant::from_millis(7) - Duration::from_millis(5), Instant::from_millis(2));
        assert_eq!(Instant::from_millis(7) - Instant::from_millis(5), Duration::from_millis(2));
    }

    #[test]
    fn test_instant_getters() {
        let instant = Instant::from_micros(5_674_321);
        assert_eq!(instant.secs(), 5);
        assert_eq!(instant.subsec_micros(), 674_321);
        assert_eq!(instant.subsec_nanos(), 674_321_000);
        assert_eq!(instant.total_nanos(), 5_674_321_000);
    }

    #[test]
    fn test_instant_from_parts() {
        assert_eq!(Instant::from_parts(2, 500), Instant::from_nanos(2_000_000_500));
    }

    #[test]
    fn test_instant_display() {
        assert_eq!(format!("{}", Instant::from_millis(5674)), "5.674000s");
        assert_eq!(format!("{}", Instant::from_secs(5)), "5.000000s");
    }

    #[test]
    fn test_checked_duration_since() {
        let sent = Instant::from_millis(1_000);
        let acked = Instant::from_millis(1_050);
        assert_eq!(acked.checked_duration_since(sent), Some(Duration::from_millis(50)));
        assert_eq!(sent.checked_duration_since(sent), Some(Duration::from_millis(0)));
        assert_eq!(sent.checked_duration_since(acked), None);
    }

    #[test]
    fn test_instant_conversions() {
        assert_eq!(Instant::from(::std::time::UNIX_EPOCH), Instant::from_millis(0));
        let later = ::std::time::UNIX_EPOCH + Duration::from_micros(2_085_955_200_000_001);
        assert_eq!(Instant::from(later), Instant::from_micros(2_085_955_200_000_001i64));
    }
}
