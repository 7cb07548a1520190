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

//! This module implements the network model: the order of each image is a
//! path through a layered graph whose nodes are (stage, command) pairs. The
//! images taking the same arc at the same stage pay for it only once.

use std::time::{Duration, Instant};

use fxhash::FxHashMap;
use log::{debug, info};

use crate::{Backend, Command, Comparison, Error, Image, LinearProgram, Problem, Schedule, Sense, SolveOptions, Solution, Solver, Status, Var};

/// An arc reaching `to` at some stage, coming from the command run at the
/// previous stage (none at the first stage)
type Transition = (usize, Option<Command>, Command);

/// Solves a binary program over the arcs of the layered graph. Each arc costs
/// the time of the command it reaches.
///
/// Two images taking the same arc may still have different prefixes, which
/// makes the optimum of this program a lower bound. A solution is flagged as
/// exact only when the compute time of its schedule meets that bound.
pub struct NetworkModel<'a> {
    backend: &'a dyn Backend,
    time_limit: Option<Duration>,
}

/// The arcs of the graph and the arcs taken by each image
struct Network {
    program: LinearProgram,
    flows: FxHashMap<(Image, Transition), Var>,
}

impl <'a> NetworkModel<'a> {
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self { backend, time_limit: None }
    }
    pub fn with_time_limit(mut self, time_limit: Option<Duration>) -> Self {
        self.time_limit = time_limit;
        self
    }

    fn build(&self, problem: &Problem) -> Network {
        let mut program = LinearProgram::new(Sense::Minimize);
        let mut arcs: FxHashMap<Transition, Var> = FxHashMap::default();
        let mut flows = FxHashMap::default();

        for i in problem.images() {
            let commands = problem.commands_of(i);
            for s in problem.stages(i) {
                for to in commands {
                    for from in sources(commands, s, *to) {
                        let t = (s, from, *to);
                        let arc = *arcs.entry(t).or_insert_with(|| {
                            let arc = program.binary();
                            program.add_objective_term(arc, problem.cost(*to));
                            arc
                        });
                        let y = program.binary();
                        program.add_constraint(vec![(arc, 1.0), (y, -1.0)], Comparison::Geq, 0.0);
                        flows.insert((i, t), y);
                    }
                }
            }
        }

        for i in problem.images() {
            let commands = problem.commands_of(i);
            for c in commands {
                // every command is reached exactly once
                let terms = problem.stages(i)
                    .flat_map(|s| sources(commands, s, *c).into_iter().map(move |from| (s, from)))
                    .map(|(s, from)| (flows[&(i, (s, from, *c))], 1.0))
                    .collect();
                program.add_constraint(terms, Comparison::Eq, 1.0);

                // the path leaves every node it reaches, but the last one
                for s in 1..commands.len() {
                    let mut terms = sources(commands, s, *c).into_iter()
                        .map(|from| (flows[&(i, (s, from, *c))], 1.0))
                        .collect::<Vec<_>>();
                    terms.extend(commands.iter()
                        .filter(|b| *b != c)
                        .map(|b| (flows[&(i, (s + 1, Some(*c), *b))], -1.0)));
                    program.add_constraint(terms, Comparison::Eq, 0.0);
                }
            }
        }
        debug!("network model: {} arcs", arcs.len());
        Network { program, flows }
    }
}

/// The possible origins of an arc reaching `to` at the given stage
fn sources(commands: &[Command], stage: usize, to: Command) -> Vec<Option<Command>> {
    if stage == 1 {
        vec![None]
    } else {
        commands.iter().filter(|c| **c != to).map(|c| Some(*c)).collect()
    }
}

impl Solver for NetworkModel<'_> {
    fn slug(&self) -> String {
        "network-model".to_string()
    }
    fn solve(&self, problem: &Problem) -> Result<Solution, Error> {
        let start = Instant::now();
        let network = self.build(problem);
        debug!("network model: {} variables, {} constraints", network.program.nb_vars(), network.program.nb_rows());

        let res = self.backend.solve(&network.program, &SolveOptions::integer(self.time_limit))?;
        if !res.is_feasible() {
            return Err(Error::SolverInfeasible("the network model".to_string()));
        }

        let mut schedule = Schedule::new();
        for i in problem.images() {
            let mut from = None;
            for s in problem.stages(i) {
                let next = problem.commands_of(i).iter()
                    .find(|to| network.flows.get(&(i, (s, from, **to))).is_some_and(|y| res.is_set(*y)));
                match next {
                    Some(to) => {
                        schedule.push(i, *to);
                        from = Some(*to);
                    },
                    None => break,
                }
            }
        }
        schedule.validate(problem).map_err(Error::Solver)?;

        let bound = res.objective;
        let cost = schedule.stats(problem).compute_time;
        info!("network bound {bound:.3}, schedule cost {cost:.3}");
        Ok(Solution {
            schedule,
            elapsed: start.elapsed(),
            is_exact: res.status == Status::Optimal && cost <= bound + 1e-6 * bound.abs().max(1.0),
            objective: Some(cost),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{MicroLp, NetworkModel, Problem, Solver};

    #[test]
    fn solves_the_example() {
        let pb = Problem::new(
            [("A", 5.0), ("B", 10.0), ("C", 7.0), ("D", 12.0)],
            [("1", vec!["A", "B"]), ("2", vec!["A", "B", "C", "D"]), ("3", vec!["B", "C", "D"])],
        ).unwrap();
        let backend = MicroLp::new();
        let solution = NetworkModel::new(&backend).solve(&pb).unwrap();
        assert!(solution.schedule.validate(&pb).is_ok());
        assert!(solution.is_exact);
        assert_eq!(39.0, solution.stats(&pb).compute_time);
    }
    #[test]
    fn images_sharing_nothing_run_everything() {
        let pb = Problem::new(
            [("A", 3.0), ("B", 4.0), ("C", 5.0), ("D", 6.0)],
            [("x", vec!["A", "B"]), ("y", vec!["C"]), ("z", vec!["D"])],
        ).unwrap();
        let backend = MicroLp::new();
        let model = NetworkModel::new(&backend);
        let solution = model.solve(&pb).unwrap();
        assert!(solution.is_exact);
        assert_eq!(Some(18.0), solution.objective);
        assert_eq!("network-model", model.slug());
    }
    #[test]
    fn arcs_shared_with_different_prefixes_only_give_a_bound() {
        // the only paths reaching the bound (20) are 1: A C, 2: A C B and
        // 3: D C B. Images 2 and 3 share the arc from C to B at stage 3
        // without sharing a prefix, so the schedule costs 26 (optimum is 23)
        let pb = Problem::new(
            [("A", 6.0), ("B", 6.0), ("C", 3.0), ("D", 2.0)],
            [("1", vec!["A", "C"]), ("2", vec!["A", "B", "C"]), ("3", vec!["B", "C", "D"])],
        ).unwrap();
        let backend = MicroLp::new();
        let solution = NetworkModel::new(&backend).solve(&pb).unwrap();
        assert!(solution.schedule.validate(&pb).is_ok());
        assert!(!solution.is_exact);
        assert_eq!(26.0, solution.stats(&pb).compute_time);
    }
}
