use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

/// Per-key coalescing of rapid edits. Each `schedule` for a key replaces the
/// pending value and pushes its deadline out by `delay`; only values whose
/// deadline has passed come back from `take_due`.
#[derive(Debug)]
pub struct Debouncer<K, V> {
    delay: Duration,
    pending: BTreeMap<K, (DateTime<Utc>, V)>,
}

impl<K: Ord + Clone, V> Debouncer<K, V> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: BTreeMap::new(),
        }
    }

    pub fn schedule(&mut self, key: K, value: V, now: DateTime<Utc>) {
        self.pending.insert(key, (now + self.delay, value));
    }

    pub fn cancel(&mut self, key: &K) -> Option<V> {
        self.pending.remove(key).map(|(_, v)| v)
    }

    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<(K, V)> {
        let due: Vec<K> = self
            .pending
            .iter()
            .filter(|(_, (deadline, _))| *deadline <= now)
            .map(|(k, _)| k.clone())
            .collect();

        due.into_iter()
            .filter_map(|k| self.pending.remove(&k).map(|(_, v)| (k, v)))
            .collect()
    }

    /// Everything still pending, regardless of deadline.
    pub fn drain(&mut self) -> Vec<(K, V)> {
        std::mem::take(&mut self.pending)
            .into_iter()
            .map(|(k, (_, v))| (k, v))
            .collect()
    }

    /// Puts back a value that was taken but could not be handled. A newer
    /// `schedule` for the same key wins.
    pub fn requeue(&mut self, key: K, value: V, now: DateTime<Utc>) {
        let deadline = now + self.delay;
        self.pending.entry(key).or_insert((deadline, value));
    }

    /// Pending values, in key order.
    pub fn pending(&self) -> impl Iterator<Item = (&K, &V)> {
        self.pending.iter().map(|(k, (_, v))| (k, v))
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn burst_collapses_to_last_value() {
        let mut d = Debouncer::new(Duration::milliseconds(300));
        d.schedule("bench", 60, t0());
        d.schedule("bench", 75, t0() + Duration::milliseconds(100));
        d.schedule("bench", 90, t0() + Duration::milliseconds(200));

        // 300ms after the first edit, but only 100ms after the last.
        assert!(d.take_due(t0() + Duration::milliseconds(300)).is_empty());

        let due = d.take_due(t0() + Duration::milliseconds(500));
        assert_eq!(due, vec![("bench", 90)]);
        assert!(d.is_empty());
    }

    #[test]
    fn keys_are_independent() {
        let mut d = Debouncer::new(Duration::milliseconds(300));
        d.schedule("bench", 60, t0());
        d.schedule("squat", 180, t0() + Duration::milliseconds(250));

        let due = d.take_due(t0() + Duration::milliseconds(300));
        assert_eq!(due, vec![("bench", 60)]);
        assert!(d.is_pending(&"squat"));

        assert_eq!(d.cancel(&"squat"), Some(180));
        assert!(d.drain().is_empty());
    }

    #[test]
    fn requeue_does_not_clobber_a_newer_edit() {
        let mut d = Debouncer::new(Duration::milliseconds(300));
        d.schedule("bench", 60, t0());
        let taken = d.take_due(t0() + Duration::milliseconds(300));
        assert_eq!(taken, vec![("bench", 60)]);

        d.schedule("bench", 75, t0() + Duration::milliseconds(350));
        d.requeue("bench", 60, t0() + Duration::milliseconds(400));
        d.requeue("squat", 180, t0() + Duration::milliseconds(400));

        let pending: Vec<_> = d.pending().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(pending, vec![("bench", 75), ("squat", 180)]);
        assert!(d.take_due(t0() + Duration::milliseconds(600)).is_empty());
        assert_eq!(
            d.take_due(t0() + Duration::milliseconds(700)),
            vec![("bench", 75), ("squat", 180)]
        );
    }
}
