//! Timer scheduling for playback.
//!
//! The engine never sleeps itself. It asks a [`Scheduler`] to arm timers and
//! is told later, through [`crate::playback::PlaybackEngine::handle_timer`],
//! which timer fired. [`TokioScheduler`] delivers firings over a channel;
//! [`ManualScheduler`] runs a virtual clock for tests and dry runs.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Shortest period a repeating timer runs at.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Handle of an armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Arms and cancels timers on behalf of the playback engine.
pub trait Scheduler {
    /// Fire once after `delay`.
    fn schedule_once(&mut self, delay: Duration) -> TimerId;

    /// Fire every `period`, starting one period from now. Periods shorter
    /// than 1 ms are raised to 1 ms.
    fn schedule_repeating(&mut self, period: Duration) -> TimerId;

    /// Stop a timer. Cancelling an unknown or finished timer does nothing.
    fn cancel(&mut self, id: TimerId);
}

#[derive(Debug, Clone)]
struct PendingTimer {
    id: TimerId,
    due: Duration,
    period: Option<Duration>,
}

/// Virtual-clock scheduler; time only moves when the owner pops timers.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    next_id: u64,
    pending: Vec<PendingTimer>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on the virtual clock.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of armed timers.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Take the earliest timer due at or before `until` and move the clock
    /// to its deadline. Repeating timers are re-armed for their next period.
    pub fn pop_due(&mut self, until: Duration) -> Option<TimerId> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due <= until)
            .min_by_key(|(_, timer)| (timer.due, timer.id))
            .map(|(index, _)| index)?;

        let PendingTimer { id, due, period } = self.pending[index].clone();
        self.now = due;
        match period {
            Some(period) => self.pending[index].due += period,
            None => {
                self.pending.remove(index);
            }
        }
        Some(id)
    }

    /// Move the clock forward without firing anything.
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    fn arm(&mut self, delay: Duration, period: Option<Duration>) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending.push(PendingTimer {
            id,
            due: self.now + delay,
            period,
        });
        id
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_once(&mut self, delay: Duration) -> TimerId {
        self.arm(delay, None)
    }

    fn schedule_repeating(&mut self, period: Duration) -> TimerId {
        let period = period.max(MIN_PERIOD);
        self.arm(period, Some(period))
    }

    fn cancel(&mut self, id: TimerId) {
        self.pending.retain(|timer| timer.id != id);
    }
}

/// Scheduler backed by tokio tasks. Firings arrive on the receiver returned
/// from [`TokioScheduler::new`]; feed them to the engine on the same task
/// that owns it.
///
/// Must be used from within a tokio runtime.
pub struct TokioScheduler {
    next_id: u64,
    sender: mpsc::UnboundedSender<TimerId>,
    tasks: HashMap<TimerId, JoinHandle<()>>,
}

impl TokioScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerId>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let scheduler = Self {
            next_id: 0,
            sender,
            tasks: HashMap::new(),
        };
        (scheduler, receiver)
    }

    fn next_id(&mut self) -> TimerId {
        self.tasks.retain(|_, task| !task.is_finished());
        self.next_id += 1;
        TimerId(self.next_id)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_once(&mut self, delay: Duration) -> TimerId {
        let id = self.next_id();
        let sender = self.sender.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = sender.send(id);
        });
        self.tasks.insert(id, task);
        id
    }

    fn schedule_repeating(&mut self, period: Duration) -> TimerId {
        let period = period.max(MIN_PERIOD);
        let id = self.next_id();
        let sender = self.sender.clone();
        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            loop {
                interval.tick().await;
                if sender.send(id).is_err() {
                    break;
                }
            }
        });
        self.tasks.insert(id, task);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(task) = self.tasks.remove(&id) {
            task.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_once_fires_at_deadline() {
        let mut scheduler = ManualScheduler::new();
        let id = scheduler.schedule_once(Duration::from_millis(600));
        assert_eq!(scheduler.pop_due(Duration::from_millis(599)), None);
        assert_eq!(scheduler.pop_due(Duration::from_millis(600)), Some(id));
        assert_eq!(scheduler.now(), Duration::from_millis(600));
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_manual_repeating_rearms() {
        let mut scheduler = ManualScheduler::new();
        let id = scheduler.schedule_repeating(Duration::from_millis(100));
        let until = Duration::from_millis(350);
        let mut fired = Vec::new();
        while let Some(timer) = scheduler.pop_due(until) {
            fired.push(timer);
        }
        assert_eq!(fired, vec![id, id, id]);
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_manual_cancel() {
        let mut scheduler = ManualScheduler::new();
        let id = scheduler.schedule_repeating(Duration::from_millis(100));
        scheduler.cancel(id);
        assert_eq!(scheduler.pop_due(Duration::from_secs(10)), None);
    }

    #[test]
    fn test_manual_fires_in_deadline_order() {
        let mut scheduler = ManualScheduler::new();
        let late = scheduler.schedule_once(Duration::from_millis(300));
        let early = scheduler.schedule_once(Duration::from_millis(100));
        let until = Duration::from_secs(1);
        assert_eq!(scheduler.pop_due(until), Some(early));
        assert_eq!(scheduler.pop_due(until), Some(late));
    }

    #[test]
    fn test_manual_zero_period_is_clamped() {
        let mut scheduler = ManualScheduler::new();
        let id = scheduler.schedule_repeating(Duration::ZERO);
        assert_eq!(scheduler.pop_due(Duration::ZERO), None);
        assert_eq!(scheduler.pop_due(Duration::from_millis(1)), Some(id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_zero_period_does_not_panic() {
        let (mut scheduler, mut fired) = TokioScheduler::new();
        let id = scheduler.schedule_repeating(Duration::ZERO);
        assert_eq!(fired.recv().await, Some(id));
        scheduler.cancel(id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_repeating_and_cancel() {
        let (mut scheduler, mut fired) = TokioScheduler::new();
        let id = scheduler.schedule_repeating(Duration::from_millis(2200));

        assert_eq!(fired.recv().await, Some(id));
        assert_eq!(fired.recv().await, Some(id));

        scheduler.cancel(id);
        let once = scheduler.schedule_once(Duration::from_millis(600));
        assert_eq!(fired.recv().await, Some(once));
    }
}
