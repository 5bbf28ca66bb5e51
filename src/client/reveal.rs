//! Progressive reveal of assistant replies, one character at a time.

use rand::Rng;
use std::sync::atomic::{ AtomicBool, Ordering };
use std::sync::{ Arc, Mutex, PoisonError };
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RevealTiming {
    pub char_delay_min: Duration,
    pub char_delay_max: Duration,
    pub line_pause: Duration,
}

impl Default for RevealTiming {
    fn default() -> Self {
        Self {
            char_delay_min: Duration::from_millis(15),
            char_delay_max: Duration::from_millis(25),
            line_pause: Duration::from_millis(200),
        }
    }
}

impl RevealTiming {
    /// No delays at all; characters still go through the state machine.
    pub fn immediate() -> Self {
        Self {
            char_delay_min: Duration::ZERO,
            char_delay_max: Duration::ZERO,
            line_pause: Duration::ZERO,
        }
    }

    pub fn char_delay(&self) -> Duration {
        let lo = self.char_delay_min.as_millis() as u64;
        let hi = (self.char_delay_max.as_millis() as u64).max(lo);
        Duration::from_millis(rand::rng().random_range(lo..=hi))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealState {
    Idle,
    Revealing {
        line: usize,
        ch: usize,
    },
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealStep {
    Char(char),
    LineBreak,
    Finished,
}

/// Shared flag that moves a running reveal straight to `Done`.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn same_as(&self, other: &CancelHandle) -> bool {
        Arc::ptr_eq(&self.cancelled, &other.cancelled)
    }
}

/// Reveals currently running for one session. Clones share the same set, so
/// a clone held outside the session can stop reveals it cannot otherwise reach.
#[derive(Debug, Clone, Default)]
pub struct RevealRegistry {
    active: Arc<Mutex<Vec<CancelHandle>>>,
}

impl RevealRegistry {
    /// Tracks `handle` until the returned guard is dropped.
    pub fn register(&self, handle: CancelHandle) -> RevealGuard {
        self.active.lock().unwrap_or_else(PoisonError::into_inner).push(handle.clone());
        RevealGuard { registry: self.clone(), handle }
    }

    /// Cancels every running reveal and returns how many there were.
    pub fn cancel_all(&self) -> usize {
        let handles: Vec<CancelHandle> = self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for handle in &handles {
            handle.cancel();
        }
        handles.len()
    }

    pub fn active(&self) -> usize {
        self.active.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Unregisters its reveal when dropped, whether the reveal finished or its
/// future was dropped part way.
pub struct RevealGuard {
    registry: RevealRegistry,
    handle: CancelHandle,
}

impl Drop for RevealGuard {
    fn drop(&mut self) {
        self.registry.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|h| !h.same_as(&self.handle));
    }
}

pub struct Reveal {
    lines: Vec<Vec<char>>,
    state: RevealState,
    cancel: CancelHandle,
}

impl Reveal {
    pub fn new(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(|line| line.chars().collect()).collect(),
            state: RevealState::Idle,
            cancel: CancelHandle::default(),
        }
    }

    pub fn state(&self) -> RevealState {
        self.state
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Advances by one unit of output. Once `Finished` is returned every
    /// further call returns `Finished` again.
    pub fn step(&mut self) -> RevealStep {
        if self.cancel.is_cancelled() {
            self.state = RevealState::Done;
        }

        let (line, ch) = match self.state {
            RevealState::Done => {
                return RevealStep::Finished;
            }
            RevealState::Idle => (0, 0),
            RevealState::Revealing { line, ch } => (line, ch),
        };

        let Some(current) = self.lines.get(line) else {
            self.state = RevealState::Done;
            return RevealStep::Finished;
        };

        if let Some(&c) = current.get(ch) {
            self.state = RevealState::Revealing { line, ch: ch + 1 };
            return RevealStep::Char(c);
        }

        if line + 1 < self.lines.len() {
            self.state = RevealState::Revealing { line: line + 1, ch: 0 };
            RevealStep::LineBreak
        } else {
            self.state = RevealState::Done;
            RevealStep::Finished
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(reveal: &mut Reveal) -> Vec<RevealStep> {
        let mut steps = Vec::new();
        loop {
            let step = reveal.step();
            steps.push(step);
            if step == RevealStep::Finished {
                return steps;
            }
        }
    }

    #[test]
    fn reveals_characters_and_line_breaks_in_order() {
        let mut reveal = Reveal::new("ab\nc");
        assert_eq!(reveal.state(), RevealState::Idle);
        assert_eq!(
            drain(&mut reveal),
            vec![
                RevealStep::Char('a'),
                RevealStep::Char('b'),
                RevealStep::LineBreak,
                RevealStep::Char('c'),
                RevealStep::Finished
            ]
        );
        assert_eq!(reveal.state(), RevealState::Done);
        assert_eq!(reveal.step(), RevealStep::Finished);
    }

    #[test]
    fn tracks_line_and_character_position() {
        let mut reveal = Reveal::new("x\nyz");
        reveal.step();
        reveal.step();
        reveal.step();
        assert_eq!(reveal.state(), RevealState::Revealing { line: 1, ch: 1 });
    }

    #[test]
    fn blank_lines_still_break() {
        let mut reveal = Reveal::new("a\n\nb");
        assert_eq!(
            drain(&mut reveal),
            vec![
                RevealStep::Char('a'),
                RevealStep::LineBreak,
                RevealStep::LineBreak,
                RevealStep::Char('b'),
                RevealStep::Finished
            ]
        );
    }

    #[test]
    fn cancelling_through_a_handle_short_circuits() {
        let mut reveal = Reveal::new("hello");
        let handle = reveal.cancel_handle();
        assert_eq!(reveal.step(), RevealStep::Char('h'));
        handle.cancel();
        assert_eq!(reveal.step(), RevealStep::Finished);
        assert_eq!(reveal.state(), RevealState::Done);
    }

    #[test]
    fn registry_forgets_reveals_when_guards_drop() {
        let registry = RevealRegistry::default();
        let first = Reveal::new("one");
        let second = Reveal::new("two");

        let guard = registry.register(first.cancel_handle());
        {
            let _inner = registry.register(second.cancel_handle());
            assert_eq!(registry.active(), 2);
        }
        assert_eq!(registry.active(), 1);
        drop(guard);
        assert_eq!(registry.active(), 0);
        assert_eq!(registry.cancel_all(), 0);
        assert!(!first.cancel_handle().is_cancelled());
    }

    #[test]
    fn cancel_all_reaches_every_running_reveal() {
        let registry = RevealRegistry::default();
        let mut reveal = Reveal::new("abc");
        let _guard = registry.register(reveal.cancel_handle());

        assert_eq!(reveal.step(), RevealStep::Char('a'));
        assert_eq!(registry.clone().cancel_all(), 1);
        assert_eq!(reveal.step(), RevealStep::Finished);
        assert_eq!(registry.active(), 0);
    }

    #[test]
    fn multibyte_characters_are_single_steps() {
        let mut reveal = Reveal::new("é😀");
        assert_eq!(reveal.step(), RevealStep::Char('é'));
        assert_eq!(reveal.step(), RevealStep::Char('😀'));
        assert_eq!(reveal.step(), RevealStep::Finished);
    }

    #[test]
    fn char_delay_stays_in_range() {
        let timing = RevealTiming::default();
        for _ in 0..200 {
            let delay = timing.char_delay();
            assert!(delay >= Duration::from_millis(15) && delay <= Duration::from_millis(25));
        }
        assert_eq!(RevealTiming::immediate().char_delay(), Duration::ZERO);
    }
}
