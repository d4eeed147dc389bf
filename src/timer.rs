// Copyright (C) 2025 Dayton Fishell
// VDP Compositor
// This file is part of vdpcomp.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Frame-ticked interpolation of a signed value towards a target.
//!
//! Both plane scrolling and palette brightness fading move one value by a
//! fixed increment every `delay` ticks until it reaches its target.

/// Offset interpolator advanced once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepTimer {
    current: i16,
    target: i16,
    increment: i16,
    delay: u16,
    countdown: u16,
}

impl StepTimer {
    pub const fn new(value: i16) -> Self {
        Self {
            current: value,
            target: value,
            increment: 0,
            delay: 0,
            countdown: 0,
        }
    }

    pub const fn current(&self) -> i16 {
        self.current
    }

    pub const fn target(&self) -> i16 {
        self.target
    }

    pub const fn increment(&self) -> i16 {
        self.increment
    }

    pub const fn delay(&self) -> u16 {
        self.delay
    }

    pub const fn is_idle(&self) -> bool {
        self.current == self.target
    }

    /// Begin moving towards `target` by `step` every `delay` ticks.
    ///
    /// The sign of the increment follows the direction of travel; only the
    /// magnitude of `step` is used. A zero delay jumps straight to the target.
    pub fn start(&mut self, target: i16, step: u16, delay: u16) {
        self.target = target;
        let magnitude = step.max(1).min(i16::MAX as u16) as i16;
        let direction = (target as i32 - self.current as i32).signum() as i16;
        self.increment = direction * magnitude;
        self.delay = delay;
        self.countdown = delay;
        if delay == 0 {
            self.current = target;
        }
    }

    /// Jump to `value` and stop.
    pub fn set(&mut self, value: i16) {
        self.current = value;
        self.target = value;
        self.increment = 0;
        self.countdown = self.delay;
    }

    /// Advance one tick. Returns true when the current value changed.
    pub fn tick(&mut self) -> bool {
        if self.is_idle() {
            return false;
        }

        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown > 0 {
            return false;
        }

        let next = self.current.saturating_add(self.increment);
        // never step past the target
        self.current = if self.increment > 0 {
            next.min(self.target)
        } else {
            next.max(self.target)
        };
        self.countdown = self.delay;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_timer_never_changes() {
        let mut t = StepTimer::new(3);
        assert!(!t.tick());
        assert_eq!(t.current(), 3);
    }

    #[test]
    fn steps_every_delay_ticks() {
        let mut t = StepTimer::new(0);
        t.start(2, 1, 3);
        assert_eq!(t.increment(), 1);
        assert!(!t.tick());
        assert!(!t.tick());
        assert!(t.tick());
        assert_eq!(t.current(), 1);
        for _ in 0..3 {
            t.tick();
        }
        assert_eq!(t.current(), 2);
        assert!(t.is_idle());
    }

    #[test]
    fn negative_direction_and_no_overshoot() {
        let mut t = StepTimer::new(10);
        t.start(1, 4, 1);
        assert_eq!(t.increment(), -4);
        t.tick();
        t.tick();
        assert_eq!(t.current(), 2);
        t.tick();
        assert_eq!(t.current(), 1);
        assert!(t.is_idle());
    }

    #[test]
    fn extreme_targets_do_not_overflow() {
        let mut t = StepTimer::new(-100);
        t.start(i16::MAX, 1, 1);
        assert_eq!(t.increment(), 1);
        assert!(t.tick());
        assert_eq!(t.current(), -99);

        let mut t = StepTimer::new(i16::MAX);
        t.start(i16::MIN, u16::MAX, 1);
        assert_eq!(t.increment(), -i16::MAX);
        for _ in 0..3 {
            t.tick();
        }
        assert_eq!(t.current(), i16::MIN);
        assert!(t.is_idle());
    }

    #[test]
    fn zero_delay_snaps() {
        let mut t = StepTimer::new(-7);
        t.start(0, 1, 0);
        assert_eq!(t.current(), 0);
        assert!(t.is_idle());
    }
}
