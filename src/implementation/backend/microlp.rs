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

//! This module provides the `Backend` implementation based on `good_lp` and
//! its pure rust `microlp` solver.

use good_lp::{constraint, microlp, variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable};
use log::{debug, warn};

use crate::{Assignment, Backend, Comparison, Error, LinearConstraint, LinearProgram, Sense, SolveOptions, Status, Var};

use super::duality::dual_program;

/// A backend delegating the resolution to microlp (through good_lp). Dual
/// prices are obtained by solving the explicit dual of the relaxed program.
///
/// Microlp has no notion of a time limit: the resolutions it performs always
/// run to completion, and the reported status is either optimal or
/// infeasible.
#[derive(Debug, Clone, Copy)]
pub struct MicroLp {
    /// Largest gap tolerated between the primal and dual objectives before a
    /// warning is emitted
    tolerance: f64,
}
impl Default for MicroLp {
    fn default() -> Self {
        Self { tolerance: 1e-6 }
    }
}
impl MicroLp {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self { tolerance }
    }
}

impl Backend for MicroLp {
    fn solve(&self, program: &LinearProgram, options: &SolveOptions) -> Result<Assignment, Error> {
        if let Some(limit) = options.time_limit {
            debug!("microlp ignores the time limit ({:.3}s)", limit.as_secs_f64());
        }
        let values = match solve_program(program, options.integer)? {
            Some(values) => values,
            None => return Ok(Assignment::infeasible()),
        };
        let objective = program.evaluate(&values);

        let duals = if options.integer {
            None
        } else {
            let dual = dual_program(program);
            let y = solve_program(&dual.program, false)?.ok_or_else(|| 
                Error::Solver("the dual of a feasible program is infeasible (unbounded primal)".to_string()))?;
            let dual_objective = dual.sign * dual.program.evaluate(&y);
            if (dual_objective - objective).abs() > self.tolerance * objective.abs().max(1.0) {
                warn!("duality gap: primal {objective} vs dual {dual_objective}");
            }
            Some(y.iter().take(program.nb_rows()).map(|v| dual.sign * v).collect())
        };

        Ok(Assignment { status: Status::Optimal, objective, values, duals })
    }
}

/// Solves the program and returns the value of each variable, or None when
/// the program is infeasible.
fn solve_program(program: &LinearProgram, integer: bool) -> Result<Option<Vec<f64>>, Error> {
    let mut vars = ProblemVariables::new();
    let xs = program.domains().iter()
        .map(|d| {
            let mut def = variable();
            if d.lower.is_finite() {
                def = def.min(d.lower);
            }
            if let Some(u) = d.upper {
                def = def.max(u);
            }
            if integer && d.integer {
                def = def.integer();
            }
            vars.add(def)
        })
        .collect::<Vec<Variable>>();

    let objective = expression(&xs, program.objective());
    let unsolved = match program.sense() {
        Sense::Minimize => vars.minimise(objective),
        Sense::Maximize => vars.maximise(objective),
    };
    let mut model = unsolved.using(microlp);
    for c in program.constraints() {
        model.add_constraint(to_constraint(&xs, c));
    }

    match model.solve() {
        Ok(solution) => Ok(Some(xs.iter().map(|x| solution.value(*x)).collect())),
        Err(ResolutionError::Infeasible) => Ok(None),
        Err(e) => Err(Error::Solver(e.to_string())),
    }
}

fn expression(xs: &[Variable], terms: &[(Var, f64)]) -> Expression {
    let mut expr = Expression::with_capacity(terms.len());
    for (v, coef) in terms.iter() {
        expr += *coef * xs[v.id()];
    }
    expr
}

fn to_constraint(xs: &[Variable], c: &LinearConstraint) -> good_lp::Constraint {
    let lhs = expression(xs, &c.terms);
    match c.cmp {
        Comparison::Leq => constraint::leq(lhs, c.rhs),
        Comparison::Geq => constraint::geq(lhs, c.rhs),
        Comparison::Eq  => constraint::eq(lhs, c.rhs),
    }
}

#[cfg(test)]
mod tests {
    use crate::{Backend, Comparison, LinearProgram, MicroLp, Row, Sense, SolveOptions, Status};

    #[test]
    fn solves_a_small_covering_program() {
        // min x + 2y s.t. x + y >= 2, x <= 1
        let mut lp = LinearProgram::new(Sense::Minimize);
        let x = lp.non_negative();
        let y = lp.non_negative();
        lp.add_objective_term(x, 1.0);
        lp.add_objective_term(y, 2.0);
        let cover = lp.add_constraint(vec![(x, 1.0), (y, 1.0)], Comparison::Geq, 2.0);
        let cap = lp.add_constraint(vec![(x, 1.0)], Comparison::Leq, 1.0);

        let res = MicroLp::new().solve(&lp, &SolveOptions::relaxed(None)).unwrap();
        assert_eq!(Status::Optimal, res.status);
        assert!((res.objective - 3.0).abs() < 1e-6);
        assert!((res.value(x) - 1.0).abs() < 1e-6);
        assert!((res.value(y) - 1.0).abs() < 1e-6);
        // increasing the demand costs 2 per unit, relaxing the cap saves 1
        assert!((res.dual(cover) - 2.0).abs() < 1e-6);
        assert!((res.dual(cap) + 1.0).abs() < 1e-6);
        assert_eq!(0.0, res.dual(Row(7)));
    }
    #[test]
    fn maximization_duals_follow_the_primal_convention() {
        // max x s.t. x <= 3
        let mut lp = LinearProgram::new(Sense::Maximize);
        let x = lp.non_negative();
        lp.add_objective_term(x, 1.0);
        let row = lp.add_constraint(vec![(x, 1.0)], Comparison::Leq, 3.0);

        let res = MicroLp::new().solve(&lp, &SolveOptions::relaxed(None)).unwrap();
        assert!((res.objective - 3.0).abs() < 1e-6);
        assert!((res.dual(row) - 1.0).abs() < 1e-6);
    }
    #[test]
    fn integrality_is_enforced_on_request() {
        // max x + y s.t. 2x + 2y <= 3 with binary x, y
        let mut lp = LinearProgram::new(Sense::Maximize);
        let x = lp.binary();
        let y = lp.binary();
        lp.add_objective_term(x, 1.0);
        lp.add_objective_term(y, 1.0);
        lp.add_constraint(vec![(x, 2.0), (y, 2.0)], Comparison::Leq, 3.0);

        let relaxed = MicroLp::new().solve(&lp, &SolveOptions::relaxed(None)).unwrap();
        assert!((relaxed.objective - 1.5).abs() < 1e-6);
        let integer = MicroLp::new().solve(&lp, &SolveOptions::integer(None)).unwrap();
        assert!((integer.objective - 1.0).abs() < 1e-6);
        assert!(integer.duals.is_none());
    }
    #[test]
    fn infeasibility_is_reported() {
        let mut lp = LinearProgram::new(Sense::Minimize);
        let x = lp.binary();
        lp.add_constraint(vec![(x, 1.0)], Comparison::Geq, 2.0);
        let res = MicroLp::new().solve(&lp, &SolveOptions::integer(None)).unwrap();
        assert_eq!(Status::Infeasible, res.status);
        assert!(!res.is_feasible());
    }
}
