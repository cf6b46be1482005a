//! Per-identifier animation state and interruption timing.

use std::time::Duration;

/// Identifies one leg of one transition; stale callbacks compare against it.
pub type LegId = u64;

/// Which way a leg travels relative to the first transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LegDirection {
    /// Towards the original target.
    Forward,
    /// Back towards where the first transition started.
    Return,
}

impl LegDirection {
    /// Direction of the leg that interrupts the `count`-th leg.
    pub fn after(count: u32) -> Self {
        if count % 2 == 0 {
            LegDirection::Forward
        } else {
            LegDirection::Return
        }
    }
}

/// Accumulated elapsed time and duration of the leg replacing an interrupted one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resume {
    pub direction: LegDirection,
    pub elapsed: Duration,
    pub leg_duration: Duration,
}

/// Timing of the leg that interrupts the `count`-th leg after it ran for `leg_elapsed`.
///
/// A return leg adds the interrupted leg's progress to the accumulated time
/// and takes exactly that long; a forward leg subtracts it and covers the rest
/// of `configured`. The accumulated time stays within `[0, configured]`.
pub fn resume_timing(count: u32, elapsed: Duration, leg_elapsed: Duration, configured: Duration) -> Resume {
    let direction = LegDirection::after(count);
    let elapsed = match direction {
        LegDirection::Forward => elapsed.saturating_sub(leg_elapsed),
        LegDirection::Return => elapsed.saturating_add(leg_elapsed),
    }
    .min(configured);

    let leg_duration = match direction {
        LegDirection::Forward => configured - elapsed,
        LegDirection::Return => elapsed,
    };

    Resume {
        direction,
        elapsed,
        leg_duration,
    }
}

/// An animation in progress for one hero id.
#[derive(Clone, Debug)]
pub struct AnimationState<E> {
    /// Proxy currently attached and animating.
    pub proxy: E,
    /// Element the current leg flies towards.
    pub target: E,
    /// 1 for the first leg, incremented whenever a leg is interrupted.
    pub count: u32,
    /// Time accumulated across legs, in forward-direction terms.
    pub elapsed: Duration,
    pub leg_start: Duration,
    pub leg_duration: Duration,
    /// Owner of the current leg.
    pub leg: LegId,
}

impl<E> AnimationState<E> {
    pub fn new(proxy: E, target: E, leg: LegId, now: Duration, duration: Duration) -> Self {
        Self {
            proxy,
            target,
            count: 1,
            elapsed: Duration::ZERO,
            leg_start: now,
            leg_duration: duration,
            leg,
        }
    }

    /// Fold the running leg into the accumulated time and hand the state to `leg`.
    ///
    /// The new leg counts from `now` even before its proxy is installed, so
    /// an interruption that arrives first sees a leg that has not moved.
    pub fn interrupt(&mut self, now: Duration, configured: Duration, leg: LegId) -> Resume {
        let leg_elapsed = now.saturating_sub(self.leg_start);
        let resume = resume_timing(self.count, self.elapsed, leg_elapsed, configured);
        self.elapsed = resume.elapsed;
        self.count += 1;
        self.leg_start = now;
        self.leg_duration = resume.leg_duration;
        self.leg = leg;
        resume
    }

    /// Install the proxy of the leg that claimed this state.
    pub fn begin_leg(&mut self, proxy: E, target: E, now: Duration, duration: Duration) {
        self.proxy = proxy;
        self.target = target;
        self.leg_start = now;
        self.leg_duration = duration;
    }

    /// Whether a callback belonging to `leg` still owns this state.
    pub fn is_current(&self, leg: LegId) -> bool {
        self.leg == leg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_first_interruption_returns() {
        let resume = resume_timing(1, Duration::ZERO, ms(400), ms(1000));
        assert_eq!(resume.direction, LegDirection::Return);
        assert_eq!(resume.elapsed, ms(400));
        assert_eq!(resume.leg_duration, ms(400));
    }

    #[test]
    fn test_second_interruption_goes_forward() {
        let resume = resume_timing(2, ms(400), ms(100), ms(1000));
        assert_eq!(resume.direction, LegDirection::Forward);
        assert_eq!(resume.elapsed, ms(300));
        assert_eq!(resume.leg_duration, ms(700));
    }

    #[test]
    fn test_elapsed_clamps() {
        // The return leg had fully finished
        let resume = resume_timing(2, ms(400), ms(900), ms(1000));
        assert_eq!(resume.elapsed, Duration::ZERO);
        assert_eq!(resume.leg_duration, ms(1000));

        // Interrupted after the forward leg should have ended
        let resume = resume_timing(1, Duration::ZERO, ms(1500), ms(1000));
        assert_eq!(resume.elapsed, ms(1000));
        assert_eq!(resume.leg_duration, ms(1000));
    }

    #[test]
    fn test_state_lifecycle() {
        let mut state = AnimationState::new("proxy-1", "b", 1, ms(0), ms(1000));
        assert_eq!(state.count, 1);

        let resume = state.interrupt(ms(250), ms(1000), 2);
        assert_eq!(resume.leg_duration, ms(250));
        assert_eq!(state.count, 2);
        assert!(state.is_current(2));
        assert!(!state.is_current(1));

        state.begin_leg("proxy-2", "a", ms(250), resume.leg_duration);
        assert_eq!(state.count, 2);
        assert_eq!(state.proxy, "proxy-2");

        let resume = state.interrupt(ms(300), ms(1000), 3);
        assert_eq!(resume.direction, LegDirection::Forward);
        assert_eq!(resume.elapsed, ms(200));
        assert_eq!(resume.leg_duration, ms(800));
    }

    #[test]
    fn test_interrupt_before_leg_installed() {
        let mut state = AnimationState::new("proxy-1", "b", 1, ms(0), ms(1000));
        state.interrupt(ms(400), ms(1000), 2);

        // Superseded again before leg 2 attached its proxy
        let resume = state.interrupt(ms(410), ms(1000), 3);
        assert_eq!(resume.direction, LegDirection::Forward);
        assert_eq!(resume.elapsed, ms(390));
        assert_eq!(resume.leg_duration, ms(610));
        assert_eq!(state.count, 3);
        assert!(state.is_current(3));
    }
}
