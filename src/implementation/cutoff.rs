// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! This module provides the implementation of the cutoff criteria that can be
//! used to bound the time spent in the column generation loop.

use std::{sync::{Arc, atomic::AtomicBool}, time::{Duration, Instant}};

use crate::Cutoff;

/// _This is the default cutoff._ It lets the column generation run until it
/// converges (or hits its iteration cap).
#[derive(Debug, Default, Copy, Clone)]
pub struct NoCutoff;
impl Cutoff for NoCutoff {
    fn must_stop(&self) -> bool {false}
}

/// This cutoff allows one to specify a maximum time budget to solve the problem.
/// Once the time budget is elapsed, no more column is generated and the
/// integer master problem is solved with the columns found so far.
///
/// # Example
/// ```
/// # use dicp::*;
/// use std::time::Duration;
///
/// let budget = TimeBudget::new(Duration::from_secs(10));
/// assert!(!budget.must_stop());
/// assert!(budget.remaining() <= Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct TimeBudget {
    stop    : Arc<AtomicBool>,
    deadline: Instant,
}
impl TimeBudget {
    pub fn new(budget: Duration) -> Self {
        let stop   = Arc::new(AtomicBool::new(false));
        let t_flag = Arc::clone(&stop);
        
        // timer
        std::thread::spawn(move || {
            std::thread::sleep(budget);
            t_flag.store(true, std::sync::atomic::Ordering::Relaxed);
        });

        TimeBudget { stop, deadline: Instant::now() + budget }
    }
    /// The time left before the budget is exhausted
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}
impl Cutoff for TimeBudget {
    fn must_stop(&self) -> bool {
        self.stop.load(std::sync::atomic::Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::{Cutoff, NoCutoff, TimeBudget};

    #[test]
    fn no_cutoff_never_stops() {
        assert!(!NoCutoff.must_stop());
    }
    #[test]
    fn time_budget_stops_once_elapsed() {
        let budget = TimeBudget::new(Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(200));
        assert!(budget.must_stop());
        assert_eq!(Duration::ZERO, budget.remaining());
    }
}
