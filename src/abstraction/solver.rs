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

//! This module defines the `Solver` trait.

use crate::{Error, Problem, Solution};

/// This is the solver abstraction. It is implemented by every method able to
/// produce a schedule for a DICP instance: the column generation, the clique
/// and stage models as well as the greedy heuristics.
pub trait Solver {
    /// A short identifier of the solver (and of its relevant settings). This
    /// is typically used to name the solution files.
    fn slug(&self) -> String;
    /// Solves the given problem. The returned `Solution` is flagged as
    /// **exact** if the method ran to completion; it is inexact when the
    /// search was cut short (time limit, iteration cap) or when the method is
    /// a mere heuristic.
    fn solve(&self, problem: &Problem) -> Result<Solution, Error>;
}
