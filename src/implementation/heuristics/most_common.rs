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

use std::time::Instant;

use crate::{Error, Heuristic, Problem, Schedule, Solution, Solver};

use super::greedy_schedule;

/// This heuristic always shares the command required by the largest number
/// of images first.
///
/// # Example
/// ```
/// # use dicp::*;
/// let problem = Problem::new(
///     [("A", 5.0), ("B", 10.0)],
///     [("1", vec!["A", "B"]), ("2", vec!["B"]), ("3", vec!["B"])],
/// ).unwrap();
/// let schedule = MostCommon.schedule(&problem);
/// let b = problem.command("B").unwrap();
/// assert_eq!(Some(&b), schedule.order(problem.image("1").unwrap()).first());
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct MostCommon;

impl Heuristic for MostCommon {
    fn schedule(&self, problem: &Problem) -> Schedule {
        greedy_schedule(problem, |_, count| count as f64)
    }
}
impl Solver for MostCommon {
    fn slug(&self) -> String {
        "most-common".to_string()
    }
    fn solve(&self, problem: &Problem) -> Result<Solution, Error> {
        let start = Instant::now();
        let schedule = self.schedule(problem);
        let stats = schedule.stats(problem);
        Ok(Solution { schedule, elapsed: start.elapsed(), is_exact: false, objective: Some(stats.compute_time) })
    }
}

#[cfg(test)]
mod tests {
    use crate::{Heuristic, MostCommon, Problem, Solver};

    #[test]
    fn shares_the_most_common_command_first() {
        let pb = Problem::new(
            [("A", 5.0), ("B", 10.0), ("C", 7.0), ("D", 12.0)],
            [("1", vec!["A", "B"]), ("2", vec!["A", "B", "C", "D"]), ("3", vec!["B", "C", "D"])],
        ).unwrap();
        let schedule = MostCommon.schedule(&pb);
        assert!(schedule.validate(&pb).is_ok());
        // B for everyone, then A for 1 and 2 (ties go to the smallest command)
        let names = schedule.to_names(&pb);
        assert_eq!(vec!["B", "A"], names["1"]);
        assert_eq!(vec!["B", "A", "C", "D"], names["2"]);
        assert_eq!(vec!["B", "C", "D"], names["3"]);
        let solution = MostCommon.solve(&pb).unwrap();
        assert!(!solution.is_exact);
        assert_eq!(Some(53.0), solution.objective);
    }
}
