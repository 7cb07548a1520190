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

//! This module implements the pricing step of the column generation: given
//! the dual prices of the relaxed master problem, it looks for a new clique
//! whose reduced cost is negative.
//!
//! The search is a small binary program. `w[i]` tells whether image `i` is
//! part of the clique, `y[c]` whether command `c` is, and `z[i, c]` whether
//! the clique covers the pair `(i, c)`. An image can only join a clique when
//! it requires all of the clique's commands. The objective is the value of
//! the covered pairs (their dual price) minus the cost of the commands.

use std::time::Duration;

use log::debug;

use crate::{Backend, Clique, Command, Comparison, Error, Image, LinearProgram, Problem, Sense, SolveOptions, Var};

use crate::model::difference;

use super::{master::Duals, pool::CliquePool};

/// A clique found by the pricing along with the gain it brings
#[derive(Debug, Clone)]
pub struct PricedClique {
    pub clique: Clique,
    /// The opposite of the reduced cost of the clique
    pub gain: f64,
}

pub struct Pricing<'a> {
    problem: &'a Problem,
    /// Gains below this threshold are considered to be zero
    tolerance: f64,
}

impl <'a> Pricing<'a> {
    pub fn new(problem: &'a Problem, tolerance: f64) -> Self {
        Self { problem, tolerance }
    }

    /// Finds the most profitable clique which is not yet part of the pool.
    /// Returns None when no clique has a positive gain.
    pub fn price(&self, backend: &dyn Backend, pool: &CliquePool, duals: &Duals, time_limit: Option<Duration>) -> Result<Option<PricedClique>, Error> {
        let problem = self.problem;
        let mut program = LinearProgram::new(Sense::Maximize);
        let w = problem.images().map(|_| program.binary()).collect::<Vec<_>>();
        let y = problem.commands()
            .map(|c| {
                let v = program.binary();
                program.add_objective_term(v, -problem.cost(c));
                v
            })
            .collect::<Vec<_>>();

        for i in problem.images() {
            for c in problem.commands() {
                let (wi, yc) = (w[i.id()], y[c.id()]);
                if problem.requires(i, c) {
                    let z = program.binary();
                    program.add_objective_term(z, duals.coverage(i, c));
                    program.add_constraint(vec![(z, 1.0), (wi, -1.0)], Comparison::Leq, 0.0);
                    program.add_constraint(vec![(z, 1.0), (yc, -1.0)], Comparison::Leq, 0.0);
                    program.add_constraint(vec![(z, 1.0), (wi, -1.0), (yc, -1.0)], Comparison::Geq, -1.0);
                } else {
                    program.add_constraint(vec![(wi, 1.0), (yc, 1.0)], Comparison::Leq, 1.0);
                }
            }
        }
        program.add_constraint(w.iter().map(|v| (*v, 1.0)).collect(), Comparison::Geq, 2.0);
        program.add_constraint(y.iter().map(|v| (*v, 1.0)).collect(), Comparison::Geq, 1.0);

        // cut off the cliques we already know
        for (_, known) in pool.shared().filter(|(_, k)| k.parent().is_none()) {
            let mut terms = Vec::with_capacity(w.len() + y.len());
            let mut rhs = 1.0;
            push_no_good(&mut terms, &mut rhs, &w, |k| known.has_image(Image(k)));
            push_no_good(&mut terms, &mut rhs, &y, |k| known.has_command(Command(k)));
            program.add_constraint(terms, Comparison::Geq, rhs);
        }

        let res = backend.solve(&program, &SolveOptions::integer(time_limit))?;
        if !res.is_feasible() || res.objective <= self.tolerance {
            return Ok(None);
        }
        let images = problem.images().filter(|i| res.is_set(w[i.id()])).collect::<Vec<_>>();
        let commands = problem.commands().filter(|c| res.is_set(y[c.id()])).collect::<Vec<_>>();
        let clique = Clique::new(problem, images, commands, None);
        debug!("priced {} (gain {:.3})", clique.label(problem), res.objective);
        Ok(Some(PricedClique { clique, gain: res.objective }))
    }

    /// Looks for cliques breaking the conflicts whose exclusion constraint has
    /// a negative price. For two conflicting cliques, the images they have in
    /// common are removed from both sides; the two resulting cliques are
    /// proposed when covering their pairs this way is cheaper than the dual
    /// prices suggest.
    pub fn refinements(&self, pool: &CliquePool, duals: &Duals) -> Vec<Clique> {
        let mut out = vec![];
        for ((a, b), price) in duals.exclusions.iter() {
            if *price >= -self.tolerance {
                continue;
            }
            let (ca, cb) = (pool.get(*a), pool.get(*b));
            if ca.images().len() <= 2 && cb.images().len() <= 2 {
                continue;
            }
            let left = difference(ca.images(), cb.images());
            let right = difference(cb.images(), ca.images());

            let save = |images: &[Image], clique: &Clique| -> f64 {
                images.iter()
                    .flat_map(|i| clique.commands().iter().map(move |c| duals.coverage(*i, *c)))
                    .sum()
            };
            let reduced = ca.cost() + cb.cost() - save(&left, ca) - save(&right, cb) + price;
            if reduced < -self.tolerance {
                if left.len() > 1 {
                    out.push(Clique::new(self.problem, left, ca.commands().to_vec(), None));
                }
                if right.len() > 1 {
                    out.push(Clique::new(self.problem, right, cb.commands().to_vec(), None));
                }
            }
        }
        out
    }
}

/// Adds the terms of a no good cut over some binary variables to `terms`:
/// the variables which are set in the known solution contribute `1 - v` and
/// the other ones contribute `v`.
fn push_no_good<F: Fn(usize) -> bool>(terms: &mut Vec<(Var, f64)>, rhs: &mut f64, vars: &[Var], is_set: F) {
    for (k, v) in vars.iter().enumerate() {
        if is_set(k) {
            terms.push((*v, -1.0));
            *rhs -= 1.0;
        } else {
            terms.push((*v, 1.0));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{Clique, CliquePool, Command, Image, MasterProblem, MicroLp, Pricing, Problem};

    fn example() -> Problem {
        Problem::new(
            [("A", 5.0), ("B", 10.0), ("C", 7.0), ("D", 12.0)],
            [("1", vec!["A", "B"]), ("2", vec!["A", "B", "C", "D"]), ("3", vec!["B", "C", "D"])],
        ).unwrap()
    }

    #[test]
    fn finds_the_best_clique_against_singleton_duals() {
        let pb = example();
        let pool = CliquePool::new(&pb);
        let relaxed = MasterProblem::new(&pb, &pool, false).solve_relaxed(&MicroLp::new(), None).unwrap();
        let priced = Pricing::new(&pb, 1e-6).price(&MicroLp::new(), &pool, &relaxed.duals, None).unwrap().unwrap();
        // sharing B C D between 2 and 3 saves 29, more than any other clique
        assert_eq!(&[Image(1), Image(2)], priced.clique.images());
        assert_eq!(&[Command(1), Command(2), Command(3)], priced.clique.commands());
        assert!((priced.gain - 29.0).abs() < 1e-6);
        assert!(priced.clique.is_consistent(&pb));
    }
    #[test]
    fn known_cliques_are_never_priced_again() {
        let pb = example();
        let mut pool = CliquePool::new(&pb);
        pool.insert(Arc::new(Clique::new(&pb, vec![Image(1), Image(2)], vec![Command(1), Command(2), Command(3)], None)));
        let relaxed = MasterProblem::new(&pb, &pool, false).solve_relaxed(&MicroLp::new(), None).unwrap();
        let priced = Pricing::new(&pb, 1e-6).price(&MicroLp::new(), &pool, &relaxed.duals, None).unwrap();
        if let Some(p) = priced {
            assert!(!pool.contains(&p.clique));
        }
    }
    #[test]
    fn nothing_is_priced_without_sharing() {
        let pb = Problem::new([("A", 1.0), ("B", 2.0)], [("1", vec!["A"]), ("2", vec!["B"])]).unwrap();
        let pool = CliquePool::new(&pb);
        let relaxed = MasterProblem::new(&pb, &pool, false).solve_relaxed(&MicroLp::new(), None).unwrap();
        let priced = Pricing::new(&pb, 1e-6).price(&MicroLp::new(), &pool, &relaxed.duals, None).unwrap();
        assert!(priced.is_none());
    }
    #[test]
    fn refinements_ignore_zero_prices() {
        let pb = example();
        let pool = CliquePool::new(&pb);
        let relaxed = MasterProblem::new(&pb, &pool, false).solve_relaxed(&MicroLp::new(), None).unwrap();
        assert!(Pricing::new(&pb, 1e-6).refinements(&pool, &relaxed.duals).is_empty());
    }
}
