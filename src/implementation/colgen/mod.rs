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

//! This module implements the column generation procedure which solves the
//! DICP. Starting from a pool of trivial cliques (every image runs every
//! command on its own), it alternates between the relaxed master problem and
//! the pricing problem until no profitable clique remains. The master problem
//! is then solved as an integer program on the final pool, and the selected
//! cliques are translated into a schedule.

mod master;
mod pool;
mod pricing;

pub use master::*;
pub use pool::*;
pub use pricing::*;

use std::{sync::Arc, time::{Duration, Instant}};

use derive_builder::Builder;
use log::{debug, info, warn};

use crate::{Backend, Cost, Cutoff, Error, Heuristic, NoCutoff, Problem, Reason, Schedule, Solution, Solver, Status, TimeBudget};

/// The settings of the column generation
#[derive(Debug, Clone, Builder)]
pub struct ColumnGenerationConfig {
    /// The maximum number of master/pricing iterations
    #[builder(default="1000")]
    pub max_iterations: usize,
    /// The wall clock budget of the whole procedure. Once elapsed, no more
    /// column is generated.
    #[builder(default="None")]
    pub time_limit: Option<Duration>,
    /// When true, the initial pool also comprises one clique per command
    /// shared by several images
    #[builder(default="false")]
    pub seed_shared_commands: bool,
    /// When true, the cliques breaking the priced conflicts are added along
    /// with the priced clique
    #[builder(default="true")]
    pub refine_intersections: bool,
    /// When true, two cliques on disjoint images may not share commands
    #[builder(default="false")]
    pub exclude_disjoint_overlaps: bool,
    /// Gains below this threshold are considered to be zero
    #[builder(default="1e-6")]
    pub tolerance: f64,
}
impl Default for ColumnGenerationConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            time_limit: None,
            seed_shared_commands: false,
            refine_intersections: true,
            exclude_disjoint_overlaps: false,
            tolerance: 1e-6,
        }
    }
}

/// What happened during one run of the column generation
#[derive(Debug, Clone)]
pub struct Report {
    /// The number of master/pricing iterations performed
    pub iterations: usize,
    /// The objective of the relaxed master problem at each iteration
    pub objectives: Vec<f64>,
    /// True iff the loop stopped because no profitable clique was left
    pub converged: bool,
    /// Why the loop (or the final resolution) was cut short, if it was
    pub stopped: Option<Reason>,
    /// The number of cliques in the final pool
    pub pool_size: usize,
    /// The objective of the integer master problem
    pub objective: Cost,
    pub status: Status,
    pub schedule: Schedule,
}

/// The column generation solver
///
/// # Example
/// ```
/// # use dicp::*;
/// let problem = Problem::new(
///     [("A", 5.0), ("B", 10.0)],
///     [("1", vec!["A", "B"]), ("2", vec!["B"])],
/// ).unwrap();
/// let backend = MicroLp::new();
/// let solver = ColumnGeneration::new(&backend, ColumnGenerationConfig::default());
/// let report = solver.run(&problem).unwrap();
/// assert!(report.converged);
/// // B is built once and shared by both images
/// assert_eq!(15.0, report.schedule.stats(&problem).compute_time);
/// ```
pub struct ColumnGeneration<'a> {
    backend: &'a dyn Backend,
    config: ColumnGenerationConfig,
    warm_start: Option<&'a dyn Heuristic>,
}

impl <'a> ColumnGeneration<'a> {
    pub fn new(backend: &'a dyn Backend, config: ColumnGenerationConfig) -> Self {
        Self { backend, config, warm_start: None }
    }
    /// Seeds the initial pool with the shared prefixes of the schedule built
    /// by the given heuristic
    pub fn with_warm_start(mut self, heuristic: &'a dyn Heuristic) -> Self {
        self.warm_start = Some(heuristic);
        self
    }
    pub fn config(&self) -> &ColumnGenerationConfig {
        &self.config
    }

    /// Runs the column generation to completion (or until it is cut short)
    pub fn run(&self, problem: &Problem) -> Result<Report, Error> {
        let budget = self.config.time_limit.map(TimeBudget::new);
        let cutoff: &dyn Cutoff = match &budget {
            Some(b) => b,
            None => &NoCutoff,
        };
        let remaining = || budget.as_ref().map(|b| b.remaining());
        let tolerance = self.config.tolerance;
        let disjoint = self.config.exclude_disjoint_overlaps;

        let mut pool = CliquePool::new(problem);
        if self.config.seed_shared_commands {
            let added = pool.seed_shared_commands(problem);
            debug!("{added} cliques seeded from the shared commands");
        }
        if let Some(heuristic) = self.warm_start {
            let added = pool.warm_start(problem, &heuristic.schedule(problem));
            debug!("{added} cliques seeded from the warm start");
        }

        let pricing = Pricing::new(problem, tolerance);
        let mut objectives: Vec<f64> = vec![];
        let mut converged = false;
        let mut stopped = None;
        let mut iterations = 0;

        while iterations < self.config.max_iterations {
            if cutoff.must_stop() {
                stopped = Some(Reason::CutoffOccurred);
                break;
            }
            iterations += 1;

            let relaxed = MasterProblem::new(problem, &pool, disjoint).solve_relaxed(self.backend, remaining())?;
            info!("iteration {:>4} | relaxed objective {:>12.3} | {} cliques", iterations, relaxed.objective, pool.len());
            if let Some(previous) = objectives.last() {
                if relaxed.objective > previous + tolerance * previous.abs().max(1.0) {
                    warn!("the relaxed objective increased from {previous} to {}", relaxed.objective);
                }
            }
            objectives.push(relaxed.objective);

            let mut added = 0;
            if let Some(priced) = pricing.price(self.backend, &pool, &relaxed.duals, remaining())? {
                if pool.insert(Arc::new(priced.clique)).is_some() {
                    added += 1;
                }
            }
            if self.config.refine_intersections {
                for clique in pricing.refinements(&pool, &relaxed.duals) {
                    if clique.is_consistent(problem) && pool.insert(Arc::new(clique)).is_some() {
                        added += 1;
                    }
                }
            }
            debug!("{added} new cliques");

            if added == 0 {
                converged = true;
                break;
            }
        }
        if !converged && stopped.is_none() {
            stopped = Some(Reason::IterationLimit);
        }
        if let Some(reason) = stopped {
            warn!("column generation stopped before convergence ({reason:?}) after {iterations} iterations");
        }

        let integer = MasterProblem::new(problem, &pool, disjoint).solve_integer(self.backend, remaining())?;
        if integer.status == Status::TimeLimitFeasible && stopped.is_none() {
            stopped = Some(Reason::SolverTimeLimit);
        }
        info!("final master objective {:.3} with {} cliques", integer.objective, pool.len());

        let schedule = translate(&pool, &integer.selected);
        Ok(Report {
            iterations,
            objectives,
            converged,
            stopped,
            pool_size: pool.len(),
            objective: integer.objective,
            status: integer.status,
            schedule,
        })
    }
}

impl Solver for ColumnGeneration<'_> {
    fn slug(&self) -> String {
        "colgen-model".to_string()
    }
    fn solve(&self, problem: &Problem) -> Result<Solution, Error> {
        let start = Instant::now();
        let report = self.run(problem)?;
        report.schedule.validate(problem).map_err(Error::Solver)?;
        Ok(Solution {
            is_exact: report.converged && report.stopped.is_none() && report.status == Status::Optimal,
            objective: Some(report.objective),
            schedule: report.schedule,
            elapsed: start.elapsed(),
        })
    }
}

/// Turns the selected cliques into a schedule. Each image runs the commands
/// of the cliques it belongs to, the cliques grouping the most images first
/// (a parent always comes before its children).
pub(crate) fn translate(pool: &CliquePool, selected: &[usize]) -> Schedule {
    let mut chosen = selected.iter().map(|k| pool.get(*k)).collect::<Vec<_>>();
    chosen.sort_by(|a, b| {
        b.images().len().cmp(&a.images().len())
            .then_with(|| a.depth().cmp(&b.depth()))
            .then_with(|| a.key().cmp(b.key()))
    });
    let mut schedule = Schedule::new();
    for clique in chosen {
        for i in clique.images() {
            for c in clique.commands() {
                schedule.push(*i, *c);
            }
        }
    }
    schedule
}
