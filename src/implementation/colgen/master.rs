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

//! This module implements the master problem of the column generation: a set
//! covering program selecting the cliques of the pool to use.
//!
//! * every (image, command) pair is covered by exactly one selected clique
//!   (at least one in the relaxation, which makes the duals non negative);
//! * at most one clique of each exclusion group is selected;
//! * two conflicting cliques are never selected together;
//! * a nested clique is only selected along with its parent.
//!
//! The total cost of the selected cliques is minimized.

use std::time::Duration;

use fxhash::FxHashMap;

use crate::{Backend, Command, Comparison, Error, Image, LinearProgram, Problem, Row, Sense, SolveOptions, Status, Var};

use super::pool::CliquePool;

/// The dual prices of the relaxed master problem
#[derive(Debug, Clone, Default)]
pub struct Duals {
    /// The price of covering each (image, command) pair
    pub coverage: FxHashMap<(Image, Command), f64>,
    /// The price of each pairwise exclusion `(clique a, clique b)`
    pub exclusions: Vec<((usize, usize), f64)>,
}
impl Duals {
    /// The price of covering `command` for `image` (zero when unknown)
    pub fn coverage(&self, image: Image, command: Command) -> f64 {
        self.coverage.get(&(image, command)).copied().unwrap_or(0.0)
    }
}

/// The outcome of the relaxed master problem
#[derive(Debug, Clone)]
pub struct RelaxedMaster {
    pub objective: f64,
    /// The (fractional) value of each clique of the pool
    pub values: Vec<f64>,
    pub duals: Duals,
}

/// The outcome of the integer master problem
#[derive(Debug, Clone)]
pub struct IntegerMaster {
    pub objective: f64,
    /// The positions of the selected cliques in the pool
    pub selected: Vec<usize>,
    pub status: Status,
}

/// The master problem over some pool of cliques
pub struct MasterProblem<'a> {
    problem: &'a Problem,
    pool: &'a CliquePool,
    /// Should multi-image cliques on disjoint images with overlapping commands
    /// be considered as conflicting ?
    disjoint_rule: bool,
}

/// A master program along with the rows whose duals are of interest
struct MasterProgram {
    program: LinearProgram,
    xs: Vec<Var>,
    coverage: Vec<((Image, Command), Row)>,
    exclusions: Vec<((usize, usize), Row)>,
}

impl <'a> MasterProblem<'a> {
    pub fn new(problem: &'a Problem, pool: &'a CliquePool, disjoint_rule: bool) -> Self {
        Self { problem, pool, disjoint_rule }
    }

    /// Solves the continuous relaxation and returns its dual prices
    pub fn solve_relaxed(&self, backend: &dyn Backend, time_limit: Option<Duration>) -> Result<RelaxedMaster, Error> {
        let master = self.build(false);
        let res = backend.solve(&master.program, &SolveOptions::relaxed(time_limit))?;
        if !res.is_feasible() {
            return Err(Error::SolverInfeasible("the relaxed master problem".to_string()));
        }
        let coverage = master.coverage.iter().map(|(pair, row)| (*pair, res.dual(*row))).collect();
        let exclusions = master.exclusions.iter().map(|(pair, row)| (*pair, res.dual(*row))).collect();
        Ok(RelaxedMaster {
            objective: res.objective,
            values: master.xs.iter().map(|x| res.value(*x)).collect(),
            duals: Duals { coverage, exclusions },
        })
    }

    /// Solves the master problem as an integer program
    pub fn solve_integer(&self, backend: &dyn Backend, time_limit: Option<Duration>) -> Result<IntegerMaster, Error> {
        let master = self.build(true);
        let res = backend.solve(&master.program, &SolveOptions::integer(time_limit))?;
        if !res.is_feasible() {
            return Err(Error::SolverInfeasible("the integer master problem".to_string()));
        }
        let selected = master.xs.iter().enumerate()
            .filter(|(_, x)| res.is_set(**x))
            .map(|(k, _)| k)
            .collect();
        Ok(IntegerMaster { objective: res.objective, selected, status: res.status })
    }

    fn build(&self, integer: bool) -> MasterProgram {
        let mut program = LinearProgram::new(Sense::Minimize);
        let xs = self.pool.iter()
            .map(|clique| {
                let x = if integer { program.binary() } else { program.non_negative() };
                program.add_objective_term(x, clique.cost());
                x
            })
            .collect::<Vec<_>>();

        let cmp = if integer { Comparison::Eq } else { Comparison::Geq };
        let mut coverage = vec![];
        for i in self.problem.images() {
            for c in self.problem.commands_of(i) {
                let terms = self.pool.covering(i, *c).iter().map(|k| (xs[*k], 1.0)).collect();
                coverage.push(((i, *c), program.add_constraint(terms, cmp, 1.0)));
            }
        }

        for group in self.pool.groups() {
            let terms = group.iter().map(|k| (xs[*k], 1.0)).collect();
            program.add_constraint(terms, Comparison::Leq, 1.0);
        }

        let mut exclusions = vec![];
        for (a, b) in self.pool.conflicts(self.disjoint_rule) {
            let row = program.add_constraint(vec![(xs[a], 1.0), (xs[b], 1.0)], Comparison::Leq, 1.0);
            exclusions.push(((a, b), row));
        }

        for (k, clique) in self.pool.iter().enumerate() {
            if let Some(parent) = clique.parent().and_then(|p| self.pool.index_of(p.key())) {
                program.add_constraint(vec![(xs[k], 1.0), (xs[parent], -1.0)], Comparison::Leq, 0.0);
            }
        }

        MasterProgram { program, xs, coverage, exclusions }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use std::time::Duration;

    use crate::{Assignment, Backend, Clique, CliquePool, Command, Error, Image, LinearProgram, MasterProblem, MicroLp, Problem, SolveOptions};

    /// A backend which finds every program infeasible
    struct NoSolution;
    impl Backend for NoSolution {
        fn solve(&self, _: &LinearProgram, _: &SolveOptions) -> Result<Assignment, Error> {
            Ok(Assignment::infeasible())
        }
    }

    fn example() -> Problem {
        Problem::new(
            [("A", 5.0), ("B", 10.0), ("C", 7.0), ("D", 12.0)],
            [("1", vec!["A", "B"]), ("2", vec!["A", "B", "C", "D"]), ("3", vec!["B", "C", "D"])],
        ).unwrap()
    }

    #[test]
    fn singletons_only_cost_the_trivial_cost() {
        let pb = example();
        let pool = CliquePool::new(&pb);
        let master = MasterProblem::new(&pb, &pool, false);
        let relaxed = master.solve_relaxed(&MicroLp::new(), None).unwrap();
        assert!((relaxed.objective - pb.trivial_cost()).abs() < 1e-6);
        // with singletons only, covering a pair costs exactly its command
        assert!((relaxed.duals.coverage(Image(1), Command(3)) - 12.0).abs() < 1e-6);
        assert!(relaxed.duals.exclusions.is_empty());

        let integer = master.solve_integer(&MicroLp::new(), None).unwrap();
        assert!((integer.objective - pb.trivial_cost()).abs() < 1e-6);
        assert_eq!(9, integer.selected.len());
    }
    #[test]
    fn shared_cliques_lower_the_cost() {
        let pb = example();
        let mut pool = CliquePool::new(&pb);
        let root = Arc::new(Clique::new(&pb, vec![Image(0), Image(1), Image(2)], vec![Command(1)], None));
        pool.insert(root.clone());
        pool.insert(Arc::new(Clique::new(&pb, vec![Image(1), Image(2)], vec![Command(2), Command(3)], Some(root))));
        let master = MasterProblem::new(&pb, &pool, false);
        let integer = master.solve_integer(&MicroLp::new(), None).unwrap();
        // B once, C D once, A twice
        assert!((integer.objective - 39.0).abs() < 1e-6);
        assert!(integer.selected.contains(&9));
        assert!(integer.selected.contains(&10));
    }
    #[test]
    fn conflicting_cliques_are_not_selected_together() {
        let pb = example();
        let mut pool = CliquePool::new(&pb);
        pool.insert(Arc::new(Clique::new(&pb, vec![Image(0), Image(1)], vec![Command(0), Command(1)], None)));
        pool.insert(Arc::new(Clique::new(&pb, vec![Image(1), Image(2)], vec![Command(1), Command(2), Command(3)], None)));
        let master = MasterProblem::new(&pb, &pool, false);
        let integer = master.solve_integer(&MicroLp::new(), None).unwrap();
        assert!(!(integer.selected.contains(&9) && integer.selected.contains(&10)));
        // {2 3, B C D} (29) plus the three singletons of A A B (20)
        assert!((integer.objective - 49.0).abs() < 1e-6);
        let relaxed = master.solve_relaxed(&MicroLp::new(), None).unwrap();
        assert_eq!(1, relaxed.duals.exclusions.len());
        assert!(relaxed.objective <= integer.objective + 1e-6);
    }
    #[test]
    fn nested_cliques_need_their_parent() {
        let pb = example();
        let mut pool = CliquePool::new(&pb);
        let root = Arc::new(Clique::new(&pb, vec![Image(1), Image(2)], vec![Command(1)], None));
        pool.insert(Arc::new(Clique::new(&pb, vec![Image(1), Image(2)], vec![Command(2), Command(3)], Some(root))));
        let master = MasterProblem::new(&pb, &pool, false);
        let integer = master.solve_integer(&MicroLp::new(), None).unwrap();
        // the child (index 10) is only selected along with its parent (index 9)
        assert!(integer.selected.contains(&10));
        assert!(integer.selected.contains(&9));
        assert!((integer.objective - 49.0).abs() < 1e-6);
    }
    #[test]
    fn an_infeasible_master_is_an_internal_error() {
        let pb = example();
        let pool = CliquePool::new(&pb);
        let master = MasterProblem::new(&pb, &pool, false);
        assert!(matches!(master.solve_relaxed(&NoSolution, None), Err(Error::SolverInfeasible(_))));
        assert!(matches!(master.solve_integer(&NoSolution, Some(Duration::from_secs(1))), Err(Error::SolverInfeasible(_))));
    }
}
