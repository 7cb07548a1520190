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

//! This module contains the serde mapping of the instance and solution files.
//! Chances are high that this module will be of little to no interest to you.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The json representation of an instance:
/// `{"commands": {id: cost, ...}, "images": {id: [commandId, ...], ...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ProblemFile {
    pub images: BTreeMap<String, Vec<String>>,
    pub commands: BTreeMap<String, f64>,
}

/// The json representation of a solution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SolutionFile {
    /// Time (in seconds) it took to find the solution
    pub elapsed_time: f64,
    /// Number of distinct command prefixes (intermediate images) built
    pub unique_images: usize,
    /// Total cost of the schedule
    pub compute_time: f64,
    /// The order in which each image runs its commands
    pub schedule: BTreeMap<String, Vec<String>>,
}
