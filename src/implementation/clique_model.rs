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

//! This module implements the clique model: all the (nested) maximal cliques
//! of the problem are enumerated upfront, and the master problem is solved
//! once, as an integer program, over these cliques.

use std::{sync::Arc, time::{Duration, Instant}};

use log::info;

use crate::{Backend, CliqueEnumerator, CliquePool, Error, MasterProblem, Problem, Solution, Solver, Status};

use super::colgen::translate;

/// Solves the DICP over the enumerated clique tree.
///
/// Only the cliques of the tree (and the singletons) are available to the
/// integer program. A solution flagged as exact is an optimum over these
/// cliques, which may miss the schedule of minimum compute time.
pub struct CliqueModel<'a> {
    backend: &'a dyn Backend,
    time_limit: Option<Duration>,
}

impl <'a> CliqueModel<'a> {
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self { backend, time_limit: None }
    }
    pub fn with_time_limit(mut self, time_limit: Option<Duration>) -> Self {
        self.time_limit = time_limit;
        self
    }
}

impl Solver for CliqueModel<'_> {
    fn slug(&self) -> String {
        "clique-model".to_string()
    }
    fn solve(&self, problem: &Problem) -> Result<Solution, Error> {
        let start = Instant::now();
        let tree = CliqueEnumerator::new(problem).enumerate();
        let flat = tree.to_cliques(problem);
        info!("{} cliques enumerated ({} levels)", flat.cliques.len(), tree.depth());

        let mut pool = CliquePool::new(problem);
        let mut position = Vec::with_capacity(flat.cliques.len());
        for clique in flat.cliques.iter() {
            let idx = pool.insert(Arc::clone(clique)).or_else(|| pool.index_of(clique.key()));
            position.push(idx);
        }
        for group in flat.groups.iter() {
            pool.add_group(group.iter().filter_map(|k| position[*k]).collect());
        }

        let master = MasterProblem::new(problem, &pool, false);
        let integer = master.solve_integer(self.backend, self.time_limit)?;
        let schedule = translate(&pool, &integer.selected);
        schedule.validate(problem).map_err(Error::Solver)?;

        Ok(Solution {
            schedule,
            elapsed: start.elapsed(),
            is_exact: integer.status == Status::Optimal,
            objective: Some(integer.objective),
        })
    }
}
