//! Aggregation of round-trip times.
//!
//! Only completed samples are considered. A set without any completes to `Error::NoData` so that
//! an unknown value is never confused with a zero round-trip time.
use core::fmt;

use crate::error::{Error, Result};
use crate::sample::SampleSet;
use crate::time::Duration;

/// The smallest completed round-trip time.
pub fn min_rtt(samples: &SampleSet) -> Result<Duration> {
    samples.rtts().min().ok_or(Error::NoData)
}

/// The largest completed round-trip time.
pub fn max_rtt(samples: &SampleSet) -> Result<Duration> {
    samples.rtts().max().ok_or(Error::NoData)
}

/// The mean of all completed round-trip times, truncated to whole nanoseconds.
pub fn avg_rtt(samples: &SampleSet) -> Result<Duration> {
    let (count, total) = samples.rtts()
        .fold((0u128, 0u128), |(count, total), rtt| (count + 1, total + rtt.as_nanos()));
    if count == 0 {
        return Err(Error::NoData);
    }
    Ok(Duration::from_nanos((total / count) as u64))
}

/// All aggregates of one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// The number of completed samples.
    pub count: usize,
    pub min: Duration,
    pub max: Duration,
    pub avg: Duration,
}

impl Summary {
    pub fn of(samples: &SampleSet) -> Result<Self> {
        Ok(Summary {
            count: samples.completed(),
            min: min_rtt(samples)?,
            max: max_rtt(samples)?,
            avg: avg_rtt(samples)?,
        })
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[min: {:.6}, max: {:.6}, avg: {:.6}]",
            self.min.as_secs_f64(), self.max.as_secs_f64(), self.avg.as_secs_f64())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::time::Instant;
    use crate::wire::TcpSeqNumber;

    fn completed(rtts: &[u64]) -> SampleSet {
        let mut set = SampleSet::new();
        for (i, &millis) in rtts.iter().enumerate() {
            let seq = TcpSeqNumber(i as i32);
            set.insert(seq, Instant::from_millis(0)).unwrap();
            set.get_mut(seq).unwrap().complete(Instant::from_millis(millis as i64));
        }
        set
    }

    #[test]
    fn aggregates() {
        let mut set = completed(&[30, 10, 50]);
        // Incomplete samples do not count.
        set.insert(TcpSeqNumber(99), Instant::from_millis(0)).unwrap();

        assert_eq!(min_rtt(&set).unwrap(), Duration::from_millis(10));
        assert_eq!(max_rtt(&set).unwrap(), Duration::from_millis(50));
        assert_eq!(avg_rtt(&set).unwrap(), Duration::from_millis(30));

        let summary = Summary::of(&set).unwrap();
        assert_eq!(summary.count, 3);
        assert!(summary.min <= summary.avg && summary.avg <= summary.max);
        assert_eq!(format!("{}", summary), "[min: 0.010000, max: 0.050000, avg: 0.030000]");
    }

    #[test]
    fn ordering_holds() {
        for rtts in [&[1u64][..], &[7, 7, 7][..], &[1, 2][..], &[3, 1000, 17, 4][..]].iter() {
            let set = completed(rtts);
            let (min, max, avg) = (min_rtt(&set).unwrap(), max_rtt(&set).unwrap(), avg_rtt(&set).unwrap());
            assert!(min <= avg, "{:?}", rtts);
            assert!(avg <= max, "{:?}", rtts);
        }
    }

    #[test]
    fn no_data() {
        let empty = SampleSet::new();
        assert!(matches!(min_rtt(&empty), Err(Error::NoData)));
        assert!(matches!(max_rtt(&empty), Err(Error::NoData)));
        assert!(matches!(avg_rtt(&empty), Err(Error::NoData)));

        let mut pending = SampleSet::new();
        pending.insert(TcpSeqNumber(1), Instant::from_millis(0)).unwrap();
        assert!(matches!(avg_rtt(&pending), Err(Error::NoData)));
        assert!(matches!(Summary::of(&pending), Err(Error::NoData)));
    }

    #[test]
    fn zero_rtt_counts() {
        let set = completed(&[0, 20]);
        assert_eq!(min_rtt(&set).unwrap(), Duration::from_millis(0));
        assert_eq!(avg_rtt(&set).unwrap(), Duration::from_millis(10));
    }
}
