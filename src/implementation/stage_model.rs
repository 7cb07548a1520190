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

//! This module implements the stage model: a plain binary program deciding
//! which command each image runs at each of its stages.
//!
//! * `x[i, s, c] = 1` iff image `i` runs command `c` at stage `s`;
//! * `y[i, j, s, c] = 1` iff images `i` and `j` share their path up to stage
//!   `s`, running command `c` at that stage.
//!
//! The objective maximizes the cost of the shared commands summed over all
//! pairs of images. This rewards sharing with many images but does not count
//! the actual cost of a schedule, which is why the objective reported in the
//! solution is the compute time of the schedule read off `x`.

use std::time::{Duration, Instant};

use fxhash::FxHashMap;
use log::debug;

use crate::{Backend, Command, Comparison, Error, Image, LinearProgram, Problem, Schedule, Sense, SolveOptions, Solution, Solver, Status, Var};

use crate::model::difference;

/// Solves the DICP with the full stage indexed binary program.
///
/// A solution flagged as exact is an optimum of the stage program, which
/// rewards pairwise sharing. It is not necessarily a schedule of minimum
/// compute time.
pub struct StageModel<'a> {
    backend: &'a dyn Backend,
    /// When set, the commands an image shares with no other image are fixed
    /// to the last stages of that image
    presolve: bool,
    time_limit: Option<Duration>,
}

impl <'a> StageModel<'a> {
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self { backend, presolve: false, time_limit: None }
    }
    pub fn with_presolve(mut self, presolve: bool) -> Self {
        self.presolve = presolve;
        self
    }
    pub fn with_time_limit(mut self, time_limit: Option<Duration>) -> Self {
        self.time_limit = time_limit;
        self
    }

    fn build(&self, problem: &Problem) -> (LinearProgram, StageVars) {
        let mut program = LinearProgram::new(Sense::Maximize);

        let x = stage_assignment(problem, &mut program);

        for (p, q, shared) in problem.sharing_pairs() {
            let mut previous: Vec<(Var, f64)> = vec![];
            for s in problem.shared_stages(p, q) {
                let mut current = Vec::with_capacity(shared.len());
                for c in shared {
                    let y = program.binary();
                    program.add_objective_term(y, problem.cost(*c));
                    program.add_constraint(vec![(y, 1.0), (x[&(p, s, *c)], -1.0)], Comparison::Leq, 0.0);
                    program.add_constraint(vec![(y, 1.0), (x[&(q, s, *c)], -1.0)], Comparison::Leq, 0.0);
                    current.push((y, 1.0));
                }
                if !previous.is_empty() {
                    let mut terms = current.clone();
                    terms.extend(previous.iter().map(|(v, _)| (*v, -1.0)));
                    program.add_constraint(terms, Comparison::Leq, 0.0);
                }
                previous = current;
            }
        }

        if self.presolve {
            for i in problem.images() {
                let mut unshared = problem.commands_of(i).to_vec();
                for j in problem.images().filter(|j| *j != i) {
                    unshared = difference(&unshared, problem.shared_commands(i, j));
                }
                let stages = problem.stages(i).rev();
                for (s, c) in stages.zip(unshared.iter()) {
                    debug!("presolve: image {} runs {} at stage {s}", problem.image_name(i), problem.command_name(*c));
                    program.fix_lower(x[&(i, s, *c)], 1.0);
                }
            }
        }

        (program, x)
    }
}

impl Solver for StageModel<'_> {
    fn slug(&self) -> String {
        if self.presolve {
            "stage-model-presol-unshared".to_string()
        } else {
            "stage-model".to_string()
        }
    }
    fn solve(&self, problem: &Problem) -> Result<Solution, Error> {
        let start = Instant::now();
        let (program, x) = self.build(problem);
        debug!("stage model: {} variables, {} constraints", program.nb_vars(), program.nb_rows());

        let res = self.backend.solve(&program, &SolveOptions::integer(self.time_limit))?;
        if !res.is_feasible() {
            return Err(Error::SolverInfeasible("the stage model".to_string()));
        }

        let schedule = read_stages(problem, &x, |v| res.is_set(v));
        schedule.validate(problem).map_err(Error::Solver)?;
        let stats = schedule.stats(problem);

        Ok(Solution {
            schedule,
            elapsed: start.elapsed(),
            is_exact: res.status == Status::Optimal,
            objective: Some(stats.compute_time),
        })
    }
}

/// The binary `x[i, s, c]` telling whether image `i` runs command `c` at stage `s`
pub(crate) type StageVars = FxHashMap<(Image, usize, Command), Var>;

/// Adds the stage assignment variables of all images to the program, along
/// with the rows making each image run one command per stage and each of its
/// commands exactly once.
pub(crate) fn stage_assignment(problem: &Problem, program: &mut LinearProgram) -> StageVars {
    let mut x = FxHashMap::default();
    for i in problem.images() {
        for s in problem.stages(i) {
            for c in problem.commands_of(i) {
                x.insert((i, s, *c), program.binary());
            }
        }
    }

    for i in problem.images() {
        for s in problem.stages(i) {
            let terms = problem.commands_of(i).iter().map(|c| (x[&(i, s, *c)], 1.0)).collect();
            program.add_constraint(terms, Comparison::Eq, 1.0);
        }
        for c in problem.commands_of(i) {
            let terms = problem.stages(i).map(|s| (x[&(i, s, *c)], 1.0)).collect();
            program.add_constraint(terms, Comparison::Eq, 1.0);
        }
    }
    x
}

/// Reads the order of each image from the assignment variables which are set
pub(crate) fn read_stages(problem: &Problem, x: &StageVars, is_set: impl Fn(Var) -> bool) -> Schedule {
    let mut schedule = Schedule::new();
    for i in problem.images() {
        for s in problem.stages(i) {
            if let Some(c) = problem.commands_of(i).iter().find(|c| is_set(x[&(i, s, **c)])) {
                schedule.push(i, *c);
            }
        }
    }
    schedule
}
