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

//! Not every solver exposes the dual prices of the constraints. This module
//! derives the explicit dual of a linear program so that these prices can be
//! obtained by solving a second program.
//!
//! The program is first normalized as `min c.x` where every variable is either
//! non negative or free. Bounds which do not fit that shape (upper bounds, non
//! zero lower bounds) become additional rows. The dual then reads
//! `max b.y` subject to `A'y <= c` (resp. `= c` for the free variables), with
//! `y >= 0` for the `>=` rows, `y <= 0` for the `<=` rows and `y` free for the
//! equalities.

use crate::{Comparison, Domain, LinearProgram, Sense, Var};

/// The explicit dual of some program
pub(crate) struct DualProgram {
    pub program: LinearProgram,
    /// Multiplier converting the dual values and objective back to the
    /// convention of the primal (1 for minimization, -1 for maximization)
    pub sign: f64,
}

pub(crate) fn dual_program(primal: &LinearProgram) -> DualProgram {
    let sign = match primal.sense() {
        Sense::Minimize =>  1.0,
        Sense::Maximize => -1.0,
    };

    let mut rows = primal.constraints().iter()
        .map(|c| (c.terms.clone(), c.cmp, c.rhs))
        .collect::<Vec<_>>();
    for (j, d) in primal.domains().iter().enumerate() {
        if d.lower.is_finite() && d.lower != 0.0 {
            rows.push((vec![(Var(j), 1.0)], Comparison::Geq, d.lower));
        }
        if let Some(u) = d.upper {
            rows.push((vec![(Var(j), 1.0)], Comparison::Leq, u));
        }
    }

    let mut dual = LinearProgram::new(Sense::Maximize);
    let mut columns = vec![vec![]; primal.nb_vars()];
    for (terms, cmp, rhs) in rows.iter() {
        let y = match cmp {
            Comparison::Geq => dual.non_negative(),
            Comparison::Leq => dual.add_var(Domain { lower: f64::NEG_INFINITY, upper: Some(0.0), integer: false }),
            Comparison::Eq  => dual.add_var(Domain { lower: f64::NEG_INFINITY, upper: None, integer: false }),
        };
        dual.add_objective_term(y, *rhs);
        for (x, coef) in terms.iter() {
            if *coef != 0.0 {
                columns[x.id()].push((y, *coef));
            }
        }
    }

    let mut costs = vec![0.0; primal.nb_vars()];
    for (x, coef) in primal.objective().iter() {
        costs[x.id()] += sign * coef;
    }
    for (j, column) in columns.into_iter().enumerate() {
        let cmp = if primal.domains()[j].lower >= 0.0 { Comparison::Leq } else { Comparison::Eq };
        dual.add_constraint(column, cmp, costs[j]);
    }

    DualProgram { program: dual, sign }
}

#[cfg(test)]
mod tests {
    use crate::{Comparison, LinearProgram, Sense};

    use super::dual_program;

    #[test]
    fn covering_rows_yield_non_negative_dual_variables() {
        let mut lp = LinearProgram::new(Sense::Minimize);
        let x = lp.non_negative();
        let y = lp.non_negative();
        lp.add_objective_term(x, 1.0);
        lp.add_objective_term(y, 2.0);
        lp.add_constraint(vec![(x, 1.0), (y, 1.0)], Comparison::Geq, 2.0);

        let dual = dual_program(&lp);
        assert_eq!(1.0, dual.sign);
        assert_eq!(Sense::Maximize, dual.program.sense());
        assert_eq!(1, dual.program.nb_vars());
        assert_eq!(0.0, dual.program.domains()[0].lower);
        assert_eq!(2, dual.program.nb_rows());
        assert!(dual.program.constraints().iter().all(|c| c.cmp == Comparison::Leq));
    }
    #[test]
    fn bounds_become_rows() {
        let mut lp = LinearProgram::new(Sense::Maximize);
        let x = lp.binary();
        let y = lp.non_negative();
        lp.fix_lower(y, 1.0);
        lp.add_objective_term(x, 1.0);
        lp.add_constraint(vec![(x, 1.0), (y, 1.0)], Comparison::Eq, 3.0);

        let dual = dual_program(&lp);
        assert_eq!(-1.0, dual.sign);
        // one row plus the upper bound of x plus the lower bound of y
        assert_eq!(3, dual.program.nb_vars());
        assert!(dual.program.domains()[0].lower.is_infinite());
        assert_eq!(Some(0.0), dual.program.domains()[1].upper);
        assert_eq!(0.0, dual.program.domains()[2].lower);
        assert_eq!(-1.0, dual.program.constraints()[0].rhs);
    }
}
