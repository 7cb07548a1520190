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

//! This module defines the errors that may be raised while loading a problem
//! or while solving it.

/// This enumeration groups the kind of errors that might occur when working
/// with a DICP instance. Loading may fail because the file is unavailable (io),
/// because it is not valid json, or because it does not describe a sound
/// instance (malformed). Solving may fail because the underlying solver
/// reported a program it should never see as infeasible, or because it failed
/// for some other reason.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// There was an io related error
    #[error("io error {0}")]
    Io(#[from] std::io::Error),
    /// The file could not be decoded (or encoded) as json
    #[error("json error {0}")]
    Json(#[from] serde_json::Error),
    /// The instance references unknown commands, is empty or has invalid costs
    #[error("malformed instance: {0}")]
    MalformedInstance(String),
    /// A program that is feasible by construction was reported infeasible.
    /// This is a bug in the way constraints were generated.
    #[error("infeasible program: {0}")]
    SolverInfeasible(String),
    /// The underlying solver failed for some other reason (unbounded, numerical issue)
    #[error("solver failure: {0}")]
    Solver(String),
    /// The configuration could not be built
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<crate::ColumnGenerationConfigBuilderError> for Error {
    fn from(e: crate::ColumnGenerationConfigBuilderError) -> Self {
        Error::Config(e.to_string())
    }
}
