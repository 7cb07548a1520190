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

//! This module implements a Benders decomposition of the stage model. The
//! master only decides the order in which each image runs its commands. The
//! sharing permitted by such an order is measured by a linear subproblem, and
//! the dual prices of that subproblem yield the optimality cuts of the master.

use std::{collections::BTreeMap, time::{Duration, Instant}};

use log::{debug, info};

use crate::{Backend, Command, Comparison, Cost, Cutoff, Domain, Error, Heuristic, Image, LinearProgram, MostCommon, NoCutoff, Problem, Reason, Row, Schedule, Sense, SolveOptions, Solution, Solver, Status, TimeBudget, Var};

use super::stage_model::{read_stages, stage_assignment, StageVars};

/// Maximizes the pairwise sharing of the stage model by Benders
/// decomposition. The first order to be evaluated is the one of the
/// `MostCommon` heuristic.
///
/// A solution flagged as exact maximizes the pairwise sharing, just like an
/// exact solution of the stage model. The schedule returned is the cheapest
/// of all the orders evaluated along the way.
pub struct BendersModel<'a> {
    backend: &'a dyn Backend,
    max_iterations: usize,
    time_limit: Option<Duration>,
    tolerance: f64,
}

/// The optimality cut `theta >= sum(coef * x)` obtained by evaluating an order
struct Cut {
    /// Opposite of the pairwise sharing of the evaluated order
    value: f64,
    terms: Vec<(Var, f64)>,
}

impl <'a> BendersModel<'a> {
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self { backend, max_iterations: 1000, time_limit: None, tolerance: 1e-6 }
    }
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
    pub fn with_time_limit(mut self, time_limit: Option<Duration>) -> Self {
        self.time_limit = time_limit;
        self
    }

    /// Measures the pairwise sharing permitted by the given order and derives
    /// the cut which is tight at that order.
    fn evaluate(&self, problem: &Problem, x: &StageVars, order: &Schedule, time_limit: Option<Duration>) -> Result<Cut, Error> {
        let runs = |i: Image, s: usize, c: Command| order.order(i).get(s - 1) == Some(&c);

        let mut sub = LinearProgram::new(Sense::Minimize);
        let mut links: Vec<(Row, Var)> = vec![];
        for (p, q, shared) in problem.sharing_pairs() {
            let mut previous: Vec<Var> = vec![];
            for s in problem.shared_stages(p, q) {
                let mut current = Vec::with_capacity(shared.len());
                for c in shared {
                    let y = sub.non_negative();
                    sub.add_objective_term(y, -problem.cost(*c));
                    for i in [p, q] {
                        let rhs = if runs(i, s, *c) { 1.0 } else { 0.0 };
                        let row = sub.add_constraint(vec![(y, 1.0)], Comparison::Leq, rhs);
                        links.push((row, x[&(i, s, *c)]));
                    }
                    current.push(y);
                }
                if !previous.is_empty() {
                    let mut terms = current.iter().map(|y| (*y, 1.0)).collect::<Vec<_>>();
                    terms.extend(previous.iter().map(|y| (*y, -1.0)));
                    sub.add_constraint(terms, Comparison::Leq, 0.0);
                }
                previous = current;
            }
        }
        if sub.nb_vars() == 0 {
            return Ok(Cut { value: 0.0, terms: vec![] });
        }

        let res = self.backend.solve(&sub, &SolveOptions::relaxed(time_limit))?;
        if !res.is_feasible() {
            return Err(Error::SolverInfeasible("the benders subproblem".to_string()));
        }
        let mut coefs: BTreeMap<Var, f64> = BTreeMap::new();
        for (row, var) in links {
            *coefs.entry(var).or_default() += res.dual(row);
        }
        let terms = coefs.into_iter().filter(|(_, coef)| *coef != 0.0).collect();
        Ok(Cut { value: res.objective, terms })
    }
}

impl Solver for BendersModel<'_> {
    fn slug(&self) -> String {
        "benders-model".to_string()
    }
    fn solve(&self, problem: &Problem) -> Result<Solution, Error> {
        let start = Instant::now();
        let budget = self.time_limit.map(TimeBudget::new);
        let cutoff: &dyn Cutoff = match &budget {
            Some(b) => b,
            None => &NoCutoff,
        };
        let remaining = || budget.as_ref().map(|b| b.remaining());

        let mut master = LinearProgram::new(Sense::Minimize);
        let theta = master.add_var(Domain { lower: f64::NEG_INFINITY, upper: None, integer: false });
        master.add_objective_term(theta, 1.0);
        let x = stage_assignment(problem, &mut master);

        let mut order = MostCommon.schedule(problem);
        let mut best: (Cost, Schedule) = (order.stats(problem).compute_time, order.clone());
        // lower bound on the opposite of the sharing, and best value reached
        let mut bound = f64::NEG_INFINITY;
        let mut incumbent = f64::INFINITY;
        let mut certified = true;
        let mut converged = false;
        let mut stopped = None;
        let mut iterations = 0;

        loop {
            iterations += 1;
            let cut = self.evaluate(problem, &x, &order, remaining())?;
            incumbent = incumbent.min(cut.value);
            info!("iteration {:>4} | sharing {:>12.3} | best {:>12.3} | bound {:>12.3}", iterations, -cut.value, -incumbent, -bound);

            let cost = order.stats(problem).compute_time;
            if cost < best.0 {
                best = (cost, order.clone());
            }
            if bound >= incumbent - self.tolerance * incumbent.abs().max(1.0) {
                converged = true;
                break;
            }
            if iterations >= self.max_iterations {
                stopped = Some(Reason::IterationLimit);
                break;
            }
            if cutoff.must_stop() {
                stopped = Some(Reason::CutoffOccurred);
                break;
            }

            let mut terms = vec![(theta, 1.0)];
            terms.extend(cut.terms.iter().map(|(v, coef)| (*v, -coef)));
            master.add_constraint(terms, Comparison::Geq, 0.0);

            let res = self.backend.solve(&master, &SolveOptions::integer(remaining()))?;
            if !res.is_feasible() {
                return Err(Error::SolverInfeasible("the benders master".to_string()));
            }
            if res.status != Status::Optimal {
                certified = false;
            }
            bound = res.value(theta);
            order = read_stages(problem, &x, |v| res.is_set(v));
            debug!("master solved with {} cuts", iterations);
        }
        if let Some(reason) = stopped {
            info!("benders stopped after {iterations} iterations ({reason:?})");
        }

        let (cost, schedule) = best;
        schedule.validate(problem).map_err(Error::Solver)?;
        Ok(Solution {
            schedule,
            elapsed: start.elapsed(),
            is_exact: converged && certified,
            objective: Some(cost),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{BendersModel, Heuristic, LinearProgram, MicroLp, MostCommon, Problem, Sense, Solver};

    use super::super::stage_model::stage_assignment;

    fn example() -> Problem {
        Problem::new(
            [("A", 5.0), ("B", 10.0), ("C", 7.0), ("D", 12.0)],
            [("1", vec!["A", "B"]), ("2", vec!["A", "B", "C", "D"]), ("3", vec!["B", "C", "D"])],
        ).unwrap()
    }

    #[test]
    fn solves_the_example() {
        let pb = example();
        let backend = MicroLp::new();
        let solution = BendersModel::new(&backend).solve(&pb).unwrap();
        assert!(solution.schedule.validate(&pb).is_ok());
        assert!(solution.is_exact);
        assert_eq!(39.0, solution.stats(&pb).compute_time);
        assert_eq!(Some(39.0), solution.objective);
    }
    #[test]
    fn the_first_order_comes_from_the_heuristic() {
        let pb = example();
        let backend = MicroLp::new();
        let solution = BendersModel::new(&backend).with_max_iterations(1).solve(&pb).unwrap();
        assert!(!solution.is_exact);
        assert_eq!(MostCommon.schedule(&pb), solution.schedule);
        assert_eq!(Some(53.0), solution.objective);
    }
    #[test]
    fn a_cut_is_tight_at_the_order_it_comes_from() {
        let pb = example();
        let backend = MicroLp::new();
        let model = BendersModel::new(&backend);
        let mut program = LinearProgram::new(Sense::Minimize);
        let x = stage_assignment(&pb, &mut program);

        // 1: B A, 2: B A C D, 3: B C D shares B three times and A once
        let order = MostCommon.schedule(&pb);
        let cut = model.evaluate(&pb, &x, &order, None).unwrap();
        assert!((cut.value + 35.0).abs() < 1e-6);

        let at_order: f64 = cut.terms.iter()
            .filter(|(v, _)| x.iter().any(|((i, s, c), w)| w == v && order.order(*i).get(s - 1) == Some(c)))
            .map(|(_, coef)| coef)
            .sum();
        assert!((at_order - cut.value).abs() < 1e-6);
    }
    #[test]
    fn images_sharing_nothing_converge_at_once() {
        let pb = Problem::new(
            [("A", 3.0), ("B", 4.0), ("C", 5.0)],
            [("x", vec!["A", "B"]), ("y", vec!["C"])],
        ).unwrap();
        let backend = MicroLp::new();
        let model = BendersModel::new(&backend);
        let solution = model.solve(&pb).unwrap();
        assert!(solution.is_exact);
        assert_eq!(pb.trivial_cost(), solution.stats(&pb).compute_time);
        assert_eq!("benders-model", model.slug());
    }
}
