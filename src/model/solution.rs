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

//! This module defines the schedules and solutions of the DICP. A schedule
//! gives the order in which each image runs its commands; any two images
//! whose schedules start with the same commands share the corresponding
//! intermediate images (which only need to be built once).

use std::{collections::BTreeMap, fs, path::Path, time::Duration};

use fxhash::FxHashSet;

use crate::{Command, Cost, Error, Image, Problem};

use super::io::SolutionFile;

/// The order in which each image runs its commands
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule(BTreeMap<Image, Vec<Command>>);

/// The quality of a schedule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    /// The number of distinct command prefixes (intermediate images)
    pub unique_images: usize,
    /// The total cost of the commands which actually need to be run
    pub compute_time: Cost,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }
    /// Appends `command` to the schedule of `image`
    pub fn push(&mut self, image: Image, command: Command) {
        self.0.entry(image).or_default().push(command);
    }
    /// The order in which `image` runs its commands (empty when unknown)
    pub fn order(&self, image: Image) -> &[Command] {
        self.0.get(&image).map(|v| v.as_slice()).unwrap_or(&[])
    }
    pub fn iter(&self) -> impl Iterator<Item = (Image, &[Command])> {
        self.0.iter().map(|(i, cmds)| (*i, cmds.as_slice()))
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    /// Checks that every image of the problem runs each of its commands
    /// exactly once, and nothing else.
    pub fn validate(&self, problem: &Problem) -> Result<(), String> {
        for image in problem.images() {
            let mut order = self.order(image).to_vec();
            order.sort_unstable();
            if order != problem.commands_of(image) {
                return Err(format!(
                    "the schedule of image {} is not a permutation of its commands",
                    problem.image_name(image)
                ));
            }
        }
        if self.0.keys().any(|i| i.id() >= problem.nb_images()) {
            return Err("the schedule mentions an unknown image".to_string());
        }
        Ok(())
    }
    /// Counts the distinct prefixes of this schedule and sums the cost of the
    /// last command of each of them.
    pub fn stats(&self, problem: &Problem) -> Stats {
        let mut seen = FxHashSet::default();
        let mut compute_time = 0.0;
        for (_, order) in self.iter() {
            for k in 1..=order.len() {
                if seen.insert(&order[..k]) {
                    compute_time += problem.cost(order[k - 1]);
                }
            }
        }
        Stats { unique_images: seen.len(), compute_time }
    }
    /// The schedule expressed with the names of the images and commands
    pub fn to_names(&self, problem: &Problem) -> BTreeMap<String, Vec<String>> {
        self.iter()
            .map(|(i, order)| {
                let order = order.iter().map(|c| problem.command_name(*c).to_string()).collect();
                (problem.image_name(i).to_string(), order)
            })
            .collect()
    }
    /// Parses a schedule expressed with the names of the images and commands
    pub fn from_names(problem: &Problem, names: &BTreeMap<String, Vec<String>>) -> Result<Self, Error> {
        let mut schedule = Schedule::new();
        for (image, order) in names.iter() {
            let i = problem.image(image)
                .ok_or_else(|| Error::MalformedInstance(format!("unknown image {image}")))?;
            for command in order.iter() {
                let c = problem.command(command)
                    .ok_or_else(|| Error::MalformedInstance(format!("unknown command {command}")))?;
                schedule.push(i, c);
            }
        }
        Ok(schedule)
    }
}

impl FromIterator<(Image, Vec<Command>)> for Schedule {
    fn from_iter<T: IntoIterator<Item = (Image, Vec<Command>)>>(iter: T) -> Self {
        Schedule(iter.into_iter().collect())
    }
}

/// The outcome of a DICP solver
#[derive(Debug, Clone)]
pub struct Solution {
    pub schedule: Schedule,
    /// The time it took to find this solution
    pub elapsed: Duration,
    /// True iff the method ran to completion
    pub is_exact: bool,
    /// The objective value reported by the solver (when it has one)
    pub objective: Option<Cost>,
}

impl Solution {
    pub fn stats(&self, problem: &Problem) -> Stats {
        self.schedule.stats(problem)
    }
    pub fn to_json(&self, problem: &Problem) -> Result<String, Error> {
        let stats = self.stats(problem);
        let file = SolutionFile {
            elapsed_time: self.elapsed.as_secs_f64(),
            unique_images: stats.unique_images,
            compute_time: stats.compute_time,
            schedule: self.schedule.to_names(problem),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }
    pub fn save<P: AsRef<Path>>(&self, path: P, problem: &Problem) -> Result<(), Error> {
        fs::write(path, self.to_json(problem)?)?;
        Ok(())
    }
    /// Loads a solution file and checks it against `problem`
    pub fn load<P: AsRef<Path>>(path: P, problem: &Problem) -> Result<Self, Error> {
        let text = fs::read_to_string(path)?;
        let file: SolutionFile = serde_json::from_str(&text)?;
        let schedule = Schedule::from_names(problem, &file.schedule)?;
        schedule.validate(problem).map_err(Error::MalformedInstance)?;
        let elapsed = Duration::try_from_secs_f64(file.elapsed_time)
            .map_err(|e| Error::MalformedInstance(format!("invalid elapsed time {}: {e}", file.elapsed_time)))?;
        Ok(Solution {
            schedule,
            elapsed,
            is_exact: false,
            objective: Some(file.compute_time),
        })
    }
}
