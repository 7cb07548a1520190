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

//! # DICP
//! This crate solves the Docker Image Construction Problem. A set of images
//! must be built, each of which requires running a set of commands (in any
//! order). Whenever two images start with the same sequence of commands, the
//! intermediate image resulting from that sequence can be built once and
//! reused by both. The goal is to find, for each image, an order of its
//! commands minimizing the total time spent running commands.
//!
//! ## Approach
//! A group of images sharing a group of commands is called a *clique*. The
//! problem is then a set covering problem: every (image, command) pair must be
//! covered by exactly one selected clique, cliques touching a same image must
//! be nested, and the total cost of the selected cliques is minimized.
//!
//! Since there are exponentially many cliques, the main solver of this crate
//! (`ColumnGeneration`) works by column generation: it solves the continuous
//! relaxation of the master problem over a small pool of cliques, and uses the
//! dual prices of that relaxation to find a new profitable clique (`Pricing`).
//! Once no such clique remains, the master problem is solved as an integer
//! program and its selection is translated into a schedule.
//!
//! Alternatively, `CliqueModel` enumerates all the (nested) maximal cliques of
//! the problem upfront, `StageModel` solves the full stage indexed program,
//! `BendersModel` decomposes that program into an ordering master and a
//! sharing subproblem, `NetworkModel` routes each image through a layered
//! graph of (stage, command) arcs, and `MostCommon` and `MostTime` build
//! greedy schedules.
//!
//! ## Quick Example
//! ```
//! use dicp::*;
//!
//! // 1. Describe the instance (it may also be loaded from a json file)
//! let problem = Problem::new(
//!     [("A", 5.0), ("B", 10.0), ("C", 7.0), ("D", 12.0)],
//!     [("1", vec!["A", "B"]), ("2", vec!["A", "B", "C", "D"]), ("3", vec!["B", "C", "D"])],
//! ).unwrap();
//!
//! // 2. Pick an LP backend and configure the column generation
//! let backend = MicroLp::new();
//! let config  = ColumnGenerationConfigBuilder::default()
//!     .max_iterations(100)
//!     .build()
//!     .unwrap();
//!
//! // 3. Solve
//! let solver   = ColumnGeneration::new(&backend, config);
//! let solution = solver.solve(&problem).unwrap();
//!
//! // 4. Every image runs each of its commands once
//! assert!(solution.schedule.validate(&problem).is_ok());
//! assert!(solution.stats(&problem).compute_time <= problem.trivial_cost());
//! ```
//!
//! ## Going further
//! The LP/MIP solver is hidden behind the `Backend` trait. `MicroLp` is a
//! pure rust implementation of that trait; other solvers can be plugged in by
//! implementing it.

mod common;
mod errors;
mod abstraction;
mod model;
mod implementation;

pub use common::*;
pub use errors::*;
pub use abstraction::*;
pub use model::*;
pub use implementation::*;
