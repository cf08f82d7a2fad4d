//! Round-trip time samples.
//!
//! A sample is started by a segment and completed by the acknowledgment of its end. Samples are
//! kept per direction of a connection in a [`SampleSet`] keyed by the expected acknowledgment.
//!
//! [`SampleSet`]: struct.SampleSet.html
use std::collections::HashMap;
use std::slice;

use crate::error::{Error, Result};
use crate::time::{Duration, Instant};
use crate::wire::TcpSeqNumber;

/// One outstanding measurement of a round-trip time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    expected_ack: TcpSeqNumber,
    sent_at: Instant,
    rtt: Option<Duration>,
}

impl Sample {
    /// Start a sample for a segment sent at `sent_at`.
    pub fn new(expected_ack: TcpSeqNumber, sent_at: Instant) -> Self {
        Sample {
            expected_ack,
            sent_at,
            rtt: None,
        }
    }

    /// The acknowledgment number that completes this sample.
    pub fn expected_ack(&self) -> TcpSeqNumber {
        self.expected_ack
    }

    /// The capture time of the segment.
    pub fn sent_at(&self) -> Instant {
        self.sent_at
    }

    /// The measured round-trip time, if the acknowledgment was seen.
    pub fn rtt(&self) -> Option<Duration> {
        self.rtt
    }

    pub fn is_complete(&self) -> bool {
        self.rtt.is_some()
    }

    /// Complete the sample with an acknowledgment captured at `acked_at`.
    ///
    /// Returns the newly computed round-trip time. A sample is completed at most once, later
    /// calls return `None` and do not change it. An acknowledgment captured before the segment
    /// leaves the sample incomplete.
    pub fn complete(&mut self, acked_at: Instant) -> Option<Duration> {
        if self.rtt.is_some() {
            return None;
        }

        self.rtt = acked_at.checked_duration_since(self.sent_at);
        if self.rtt.is_none() {
            net_debug!("ack at {} precedes segment at {}", acked_at, self.sent_at);
        }
        self.rtt
    }
}

/// The samples of one direction of a connection.
///
/// Samples are kept in insertion order with an index by expected acknowledgment.
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    samples: Vec<Sample>,
    index: HashMap<TcpSeqNumber, usize>,
}

impl SampleSet {
    pub fn new() -> Self {
        SampleSet::default()
    }

    /// Start a new sample.
    ///
    /// Fails with `Error::DuplicateSample` if a sample with the same expected acknowledgment
    /// exists, which is left untouched.
    pub fn insert(&mut self, expected_ack: TcpSeqNumber, sent_at: Instant) -> Result<&Sample> {
        if self.index.contains_key(&expected_ack) {
            return Err(Error::DuplicateSample(expected_ack));
        }

        let idx = self.samples.len();
        self.samples.push(Sample::new(expected_ack, sent_at));
        self.index.insert(expected_ack, idx);
        Ok(&self.samples[idx])
    }

    pub fn get(&self, expected_ack: TcpSeqNumber) -> Option<&Sample> {
        let idx = *self.index.get(&expected_ack)?;
        self.samples.get(idx)
    }

    pub fn get_mut(&mut self, expected_ack: TcpSeqNumber) -> Option<&mut Sample> {
        let idx = *self.index.get(&expected_ack)?;
        self.samples.get_mut(idx)
    }

    pub fn contains(&self, expected_ack: TcpSeqNumber) -> bool {
        self.index.contains_key(&expected_ack)
    }

    /// Iterate over all samples in insertion order.
    pub fn iter(&self) -> slice::Iter<Sample> {
        self.samples.iter()
    }

    /// Iterate over the round-trip times of completed samples.
    pub fn rtts<'a>(&'a self) -> impl Iterator<Item=Duration> + 'a {
        self.samples.iter().filter_map(Sample::rtt)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The number of completed samples.
    pub fn completed(&self) -> usize {
        self.rtts().count()
    }
}

impl<'a> IntoIterator for &'a SampleSet {
    type Item = &'a Sample;
    type IntoIter = slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn complete_once() {
        let mut sample = Sample::new(TcpSeqNumber(101), Instant::from_millis(0));
        assert!(!sample.is_complete());
        assert_eq!(sample.complete(Instant::from_millis(50)), Some(Duration::from_millis(50)));
        assert_eq!(sample.complete(Instant::from_millis(80)), None);
        assert_eq!(sample.rtt(), Some(Duration::from_millis(50)));
    }

    #[test]
    fn complete_before_sent() {
        let mut sample = Sample::new(TcpSeqNumber(101), Instant::from_millis(100));
        assert_eq!(sample.complete(Instant::from_millis(50)), None);
        assert_eq!(sample.rtt(), None);
        // A later acknowledgment may still complete it.
        assert_eq!(sample.complete(Instant::from_millis(150)), Some(Duration::from_millis(50)));
    }

    #[test]
    fn zero_rtt_is_complete() {
        let mut sample = Sample::new(TcpSeqNumber(1), Instant::from_millis(7));
        assert_eq!(sample.complete(Instant::from_millis(7)), Some(Duration::from_millis(0)));
        assert!(sample.is_complete());
    }

    #[test]
    fn reject_duplicates() {
        let mut set = SampleSet::new();
        set.insert(TcpSeqNumber(101), Instant::from_millis(0)).unwrap();
        set.get_mut(TcpSeqNumber(101)).unwrap().complete(Instant::from_millis(20));

        match set.insert(TcpSeqNumber(101), Instant::from_millis(30)) {
            Err(Error::DuplicateSample(seq)) => assert_eq!(seq, TcpSeqNumber(101)),
            other => panic!("expected a duplicate, got {:?}", other),
        }

        let sample = set.get(TcpSeqNumber(101)).unwrap();
        assert_eq!(sample.sent_at(), Instant::from_millis(0));
        assert_eq!(sample.rtt(), Some(Duration::from_millis(20)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn insertion_order() {
        let mut set = SampleSet::new();
        for &seq in [300, 100, 200].iter() {
            set.insert(TcpSeqNumber(seq), Instant::from_millis(seq)).unwrap();
        }
        let order: Vec<_> = set.iter().map(|sample| sample.expected_ack().0).collect();
        assert_eq!(order, [300, 100, 200]);
        assert!(set.contains(TcpSeqNumber(200)));
        assert!(set.get(TcpSeqNumber(400)).is_none());
    }

    #[test]
    fn completed_rtts() {
        let mut set = SampleSet::new();
        assert!(set.is_empty());
        set.insert(TcpSeqNumber(1), Instant::from_millis(0)).unwrap();
        set.insert(TcpSeqNumber(2), Instant::from_millis(0)).unwrap();
        set.get_mut(TcpSeqNumber(2)).unwrap().complete(Instant::from_millis(5));
        assert_eq!(set.completed(), 1);
        assert_eq!(set.rtts().collect::<Vec<_>>(), [Duration::from_millis(5)]);
    }
}
