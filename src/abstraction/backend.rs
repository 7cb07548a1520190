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

//! This module defines the mixed integer programming capability the core
//! algorithms rely upon. A `LinearProgram` is a plain description of some
//! decision variables, linear constraints and a linear objective. A `Backend`
//! is anything able to solve such a program, either as an integer program or
//! as its continuous relaxation (in which case it must also provide the dual
//! prices of the constraints).

use std::time::Duration;

use crate::Error;

/// A decision variable of a linear program. It is identified by its position
/// in the program.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Var(pub usize);
impl Var {
    #[inline]
    pub fn id(self) -> usize {
        self.0
    }
}

/// A constraint (row) of a linear program. It is identified by its position
/// in the program.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Row(pub usize);
impl Row {
    #[inline]
    pub fn id(self) -> usize {
        self.0
    }
}

/// The optimization direction of a program
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Sense {
    Minimize,
    Maximize,
}

/// How the left hand side of a constraint compares to its right hand side
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Comparison {
    Leq,
    Geq,
    Eq,
}

/// The domain of a decision variable
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Domain {
    /// The lower bound of the variable (possibly minus infinity)
    pub lower: f64,
    /// The upper bound of the variable (if any)
    pub upper: Option<f64>,
    /// Must the variable take an integral value ?
    pub integer: bool,
}

/// A linear constraint `sum(coef * var) <cmp> rhs`
#[derive(Clone, Debug, PartialEq)]
pub struct LinearConstraint {
    pub terms: Vec<(Var, f64)>,
    pub cmp: Comparison,
    pub rhs: f64,
}

/// A linear program (possibly with integer variables).
#[derive(Clone, Debug)]
pub struct LinearProgram {
    sense: Sense,
    domains: Vec<Domain>,
    constraints: Vec<LinearConstraint>,
    objective: Vec<(Var, f64)>,
}

impl LinearProgram {
    /// Creates an empty program with the given optimization direction
    pub fn new(sense: Sense) -> Self {
        Self { sense, domains: vec![], constraints: vec![], objective: vec![] }
    }
    /// Adds a variable with the given domain to the program
    pub fn add_var(&mut self, domain: Domain) -> Var {
        self.domains.push(domain);
        Var(self.domains.len() - 1)
    }
    /// Adds a non negative continuous variable
    pub fn non_negative(&mut self) -> Var {
        self.add_var(Domain { lower: 0.0, upper: None, integer: false })
    }
    /// Adds a 0/1 variable
    pub fn binary(&mut self) -> Var {
        self.add_var(Domain { lower: 0.0, upper: Some(1.0), integer: true })
    }
    /// Tightens the lower bound of some variable
    pub fn fix_lower(&mut self, var: Var, lower: f64) {
        self.domains[var.id()].lower = lower;
    }
    /// Adds `coef * var` to the objective function
    pub fn add_objective_term(&mut self, var: Var, coef: f64) {
        if coef != 0.0 {
            self.objective.push((var, coef));
        }
    }
    /// Adds a constraint to the program and returns its identifier
    pub fn add_constraint(&mut self, terms: Vec<(Var, f64)>, cmp: Comparison, rhs: f64) -> Row {
        self.constraints.push(LinearConstraint { terms, cmp, rhs });
        Row(self.constraints.len() - 1)
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }
    pub fn nb_vars(&self) -> usize {
        self.domains.len()
    }
    pub fn nb_rows(&self) -> usize {
        self.constraints.len()
    }
    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }
    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }
    pub fn objective(&self) -> &[(Var, f64)] {
        &self.objective
    }
    /// True iff at least one variable must take an integral value
    pub fn has_integers(&self) -> bool {
        self.domains.iter().any(|d| d.integer)
    }
    /// Evaluates the objective function for the given assignment of values
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.objective.iter().map(|(v, c)| c * values[v.id()]).sum()
    }
    /// Returns true iff the given assignment satisfies all the constraints
    /// and bounds of the program (up to `tolerance`).
    pub fn is_satisfied_by(&self, values: &[f64], tolerance: f64) -> bool {
        let bounds_ok = self.domains.iter().zip(values.iter()).all(|(d, x)| {
            *x >= d.lower - tolerance && d.upper.map_or(true, |u| *x <= u + tolerance)
        });
        bounds_ok && self.constraints.iter().all(|c| {
            let lhs: f64 = c.terms.iter().map(|(v, k)| k * values[v.id()]).sum();
            match c.cmp {
                Comparison::Leq => lhs <= c.rhs + tolerance,
                Comparison::Geq => lhs >= c.rhs - tolerance,
                Comparison::Eq  => (lhs - c.rhs).abs() <= tolerance,
            }
        })
    }
}

/// The options passed on to a backend along with the program to solve
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SolveOptions {
    /// Should integrality be enforced ? When this is false, the continuous
    /// relaxation of the program is solved and dual prices are computed.
    pub integer: bool,
    /// An optional wall clock budget granted to the backend
    pub time_limit: Option<Duration>,
}
impl SolveOptions {
    pub fn relaxed(time_limit: Option<Duration>) -> Self {
        Self { integer: false, time_limit }
    }
    pub fn integer(time_limit: Option<Duration>) -> Self {
        Self { integer: true, time_limit }
    }
}

/// The status reported by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// The returned assignment is proven optimal
    Optimal,
    /// The time limit was hit; the returned assignment is the best incumbent
    TimeLimitFeasible,
    /// The program admits no solution
    Infeasible,
}

/// The outcome of a resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub status: Status,
    /// The value of the objective function (NaN when infeasible)
    pub objective: f64,
    /// The value of each variable, indexed by `Var`
    pub values: Vec<f64>,
    /// The dual price of each row, indexed by `Row`. Only present when the
    /// continuous relaxation was solved.
    pub duals: Option<Vec<f64>>,
}
impl Assignment {
    /// The assignment reported for an infeasible program
    pub fn infeasible() -> Self {
        Self { status: Status::Infeasible, objective: f64::NAN, values: vec![], duals: None }
    }
    pub fn is_feasible(&self) -> bool {
        self.status != Status::Infeasible
    }
    pub fn value(&self, var: Var) -> f64 {
        self.values[var.id()]
    }
    /// True iff the given (binary) variable is set in this assignment
    pub fn is_set(&self, var: Var) -> bool {
        self.value(var) > 0.5
    }
    /// The dual price of some row. Zero means "no signal", which is also what
    /// is returned when no duals were computed or the row is unknown.
    pub fn dual(&self, row: Row) -> f64 {
        self.duals.as_ref().and_then(|d| d.get(row.id()).copied()).unwrap_or(0.0)
    }
}

/// This is the mixed integer programming capability: given a program, return
/// an optimal (or time limited best) assignment, together with dual prices
/// when solving the continuous relaxation.
pub trait Backend {
    /// Solves `program` according to the given `options`.
    fn solve(&self, program: &LinearProgram, options: &SolveOptions) -> Result<Assignment, Error>;
}

#[cfg(test)]
mod tests {
    use crate::{LinearProgram, Sense, Comparison, Assignment, Status, Row};

    #[test]
    fn zero_coefficients_are_not_part_of_the_objective() {
        let mut lp = LinearProgram::new(Sense::Minimize);
        let x = lp.binary();
        let y = lp.binary();
        lp.add_objective_term(x, 0.0);
        lp.add_objective_term(y, 3.0);
        assert_eq!(1, lp.objective().len());
        assert_eq!(6.0, lp.evaluate(&[1.0, 2.0]));
    }
    #[test]
    fn satisfaction_checks_bounds_and_rows() {
        let mut lp = LinearProgram::new(Sense::Minimize);
        let x = lp.binary();
        let y = lp.non_negative();
        lp.add_constraint(vec![(x, 1.0), (y, 1.0)], Comparison::Geq, 1.0);
        lp.add_constraint(vec![(x, 1.0), (y, -1.0)], Comparison::Eq, 0.0);

        assert!(lp.is_satisfied_by(&[0.5, 0.5], 1e-9));
        assert!(!lp.is_satisfied_by(&[0.0, 0.0], 1e-9));
        assert!(!lp.is_satisfied_by(&[2.0, 2.0], 1e-9));
        assert!(lp.has_integers());
    }
    #[test]
    fn missing_duals_carry_no_signal() {
        let a = Assignment { status: Status::Optimal, objective: 0.0, values: vec![], duals: None };
        assert_eq!(0.0, a.dual(Row(3)));
        assert!(!Assignment::infeasible().is_feasible());
    }
}
