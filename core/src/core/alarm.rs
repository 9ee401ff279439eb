//! Clock counter and pending timed callbacks ("alarms").
//!
//! Peripherals that run off the same master clock as the CPU do not poll
//! every cycle. Instead they schedule an alarm for the next cycle on which
//! something observable happens (timer underflow, raster line, ...), and the
//! board fires it from [`Board::tick`](crate::core::Board).
//!
//! Ordering: ascending trigger cycle, ties broken by insertion order. An
//! alarm never fires before the clock has reached its trigger cycle. An
//! alarm scheduled into the past fires on the next check.

use std::collections::{BTreeMap, HashMap};

use log::trace;

use crate::core::interrupt::{InterruptLine, InterruptLines, InterruptSource};
use crate::core::memory::{AddressSpace, HandlerId};

/// Handle returned by the scheduling calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlarmId(u64);

/// What happens to an alarm after its callback returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlarmAction {
    /// One-shot: forget the alarm.
    Done,
    /// Keep the alarm (same id) and fire it again at the given cycle.
    Reschedule(u64),
}

pub type AlarmCallback = Box<dyn FnMut(&mut AlarmContext<'_>) -> AlarmAction>;

pub(crate) enum AlarmTarget {
    Callback(AlarmCallback),
    Handler(HandlerId),
}

struct Slot {
    /// Queue key while pending, `None` while the alarm is firing.
    key: Option<(u64, u64)>,
    /// Taken out while the alarm is firing.
    target: Option<AlarmTarget>,
}

pub struct AlarmScheduler {
    clock: u64,
    next_seq: u64,
    next_id: u64,
    queue: BTreeMap<(u64, u64), AlarmId>,
    slots: HashMap<AlarmId, Slot>,
}

impl AlarmScheduler {
    pub fn new() -> Self {
        Self {
            clock: 0,
            next_seq: 0,
            next_id: 0,
            queue: BTreeMap::new(),
            slots: HashMap::new(),
        }
    }

    #[inline]
    pub fn now(&self) -> u64 {
        self.clock
    }

    /// Advance the clock by one cycle. Due alarms are fired by the caller,
    /// which owns the state the callbacks need.
    #[inline]
    pub fn advance(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Earliest pending trigger cycle.
    #[inline]
    pub fn next_due(&self) -> Option<u64> {
        self.queue.keys().next().map(|&(at, _)| at)
    }

    /// Number of alarms waiting in the queue.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_pending(&self, id: AlarmId) -> bool {
        self.slots.get(&id).is_some_and(|slot| slot.key.is_some())
    }

    pub fn schedule(&mut self, at: u64, callback: AlarmCallback) -> AlarmId {
        self.insert(at, AlarmTarget::Callback(callback))
    }

    /// Schedule an alarm that calls [`IoHandler::on_alarm`](crate::core::IoHandler::on_alarm)
    /// on a mapped device.
    pub fn schedule_handler(&mut self, at: u64, handler: HandlerId) -> AlarmId {
        self.insert(at, AlarmTarget::Handler(handler))
    }

    /// Move a pending (or currently firing) alarm. Returns false if the
    /// alarm no longer exists.
    pub fn reschedule(&mut self, id: AlarmId, at: u64) -> bool {
        let Some(old) = self.slots.get(&id).map(|slot| slot.key) else {
            return false;
        };
        if let Some(old) = old {
            self.queue.remove(&old);
        }
        let key = self.next_key(at);
        self.queue.insert(key, id);
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.key = Some(key);
        }
        true
    }

    /// Cancel an alarm. Cancelling from inside the alarm's own callback
    /// wins over a `Reschedule` return value.
    pub fn cancel(&mut self, id: AlarmId) -> bool {
        match self.slots.remove(&id) {
            Some(slot) => {
                if let Some(key) = slot.key {
                    self.queue.remove(&key);
                }
                true
            }
            None => false,
        }
    }

    /// Machine reset: the clock returns to zero and every pending alarm
    /// keeps its distance to it (past-due alarms become due at zero).
    pub fn rebase(&mut self) {
        let clock = self.clock;
        let old = std::mem::take(&mut self.queue);
        for ((at, seq), id) in old {
            let key = (at.saturating_sub(clock), seq);
            self.queue.insert(key, id);
            if let Some(slot) = self.slots.get_mut(&id) {
                slot.key = Some(key);
            }
        }
        self.clock = 0;
    }

    fn next_key(&mut self, at: u64) -> (u64, u64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        (at, seq)
    }

    fn insert(&mut self, at: u64, target: AlarmTarget) -> AlarmId {
        let id = AlarmId(self.next_id);
        self.next_id += 1;
        let key = self.next_key(at);
        self.queue.insert(key, id);
        self.slots.insert(
            id,
            Slot {
                key: Some(key),
                target: Some(target),
            },
        );
        trace!("alarm {id:?} scheduled for cycle {at} (now {})", self.clock);
        id
    }

    /// Start a dispatch pass. Alarms inserted after this point are left
    /// for the next pass even if they are already due.
    pub(crate) fn dispatch_barrier(&self) -> u64 {
        self.next_seq
    }

    /// Remove the first due alarm older than `barrier` and hand its target
    /// to the dispatcher.
    pub(crate) fn take_due(&mut self, barrier: u64) -> Option<(AlarmId, AlarmTarget)> {
        let (key, id) = self
            .queue
            .range(..=(self.clock, u64::MAX))
            .find(|((_, seq), _)| *seq < barrier)
            .map(|(&key, &id)| (key, id))?;
        self.queue.remove(&key);
        let slot = self.slots.get_mut(&id)?;
        slot.key = None;
        let target = slot.target.take()?;
        trace!("alarm {id:?} fires at cycle {} (due {})", self.clock, key.0);
        Some((id, target))
    }

    /// Put a fired alarm's target back and apply the callback's verdict.
    pub(crate) fn finish(&mut self, id: AlarmId, target: AlarmTarget, action: AlarmAction) {
        let rescheduled_inside = match self.slots.get(&id) {
            // Cancelled from inside the callback.
            None => return,
            Some(slot) => slot.key.is_some(),
        };
        if !rescheduled_inside {
            match action {
                AlarmAction::Done => {
                    self.slots.remove(&id);
                    return;
                }
                AlarmAction::Reschedule(at) => {
                    let key = self.next_key(at);
                    self.queue.insert(key, id);
                    if let Some(slot) = self.slots.get_mut(&id) {
                        slot.key = Some(key);
                    }
                }
            }
        }
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.target = Some(target);
        }
    }
}

impl Default for AlarmScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// State an alarm callback may touch while it runs.
pub struct AlarmContext<'a> {
    pub(crate) id: AlarmId,
    pub memory: &'a mut AddressSpace,
    pub interrupts: &'a mut InterruptLines,
    pub(crate) alarms: &'a mut AlarmScheduler,
}

impl AlarmContext<'_> {
    /// The cycle on which the alarm is firing.
    pub fn now(&self) -> u64 {
        self.alarms.now()
    }

    /// Id of the firing alarm.
    pub fn id(&self) -> AlarmId {
        self.id
    }

    pub fn schedule(&mut self, at: u64, callback: AlarmCallback) -> AlarmId {
        self.alarms.schedule(at, callback)
    }

    pub fn schedule_handler(&mut self, at: u64, handler: HandlerId) -> AlarmId {
        self.alarms.schedule_handler(at, handler)
    }

    pub fn reschedule(&mut self, id: AlarmId, at: u64) -> bool {
        self.alarms.reschedule(id, at)
    }

    pub fn cancel(&mut self, id: AlarmId) -> bool {
        self.alarms.cancel(id)
    }

    pub fn assert_interrupt(&mut self, line: InterruptLine, source: InterruptSource) {
        self.interrupts.assert(line, source);
    }

    pub fn clear_interrupt(&mut self, line: InterruptLine, source: InterruptSource) {
        self.interrupts.clear(line, source);
    }
}
