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

/// This heuristic always shares the command which saves the most time first:
/// the one maximizing its cost times the number of images that would not
/// have to run it again.
#[derive(Debug, Default, Clone, Copy)]
pub struct MostTime;

impl Heuristic for MostTime {
    fn schedule(&self, problem: &Problem) -> Schedule {
        greedy_schedule(problem, |c, count| problem.cost(c) * count.saturating_sub(1) as f64)
    }
}
impl Solver for MostTime {
    fn slug(&self) -> String {
        "most-time".to_string()
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
    use crate::{Heuristic, MostTime, Problem};

    #[test]
    fn shares_the_most_expensive_command_first() {
        let pb = Problem::new(
            [("A", 5.0), ("B", 10.0), ("C", 7.0), ("D", 12.0)],
            [("1", vec!["A", "B"]), ("2", vec!["A", "B", "C", "D"]), ("3", vec!["B", "C", "D"])],
        ).unwrap();
        let schedule = MostTime.schedule(&pb);
        assert!(schedule.validate(&pb).is_ok());
        // B saves 20, D saves 12, C saves 7, A saves 5
        let names = schedule.to_names(&pb);
        assert_eq!(vec!["B", "A"], names["1"]);
        assert_eq!(vec!["B", "D", "C", "A"], names["2"]);
        assert_eq!(vec!["B", "D", "C"], names["3"]);
        assert_eq!(39.0, schedule.stats(&pb).compute_time);
    }
}
