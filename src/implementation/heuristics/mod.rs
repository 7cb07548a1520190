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

//! This module provides greedy heuristics for the DICP. They all follow the
//! same scheme: among the commands left to run by a group of images, pick the
//! best one according to some score, let all the images of the group which
//! require it run it next, and go on with the images that took the command
//! on one side and with those that did not on the other side.

mod most_common;
mod most_time;

pub use most_common::*;
pub use most_time::*;

use std::collections::BTreeMap;

use crate::{Command, Image, Problem, Schedule};

/// Builds a schedule by greedily sharing the command with the highest score.
/// The score of a command depends on the number of images of the current
/// group requiring it. Ties are broken in favor of the smallest command.
pub(crate) fn greedy_schedule<F>(problem: &Problem, score: F) -> Schedule
where F: Fn(Command, usize) -> f64
{
    let mut schedule = Schedule::new();
    let root = problem.images()
        .map(|i| (i, problem.commands_of(i).to_vec()))
        .filter(|(_, cmds)| !cmds.is_empty())
        .collect::<BTreeMap<Image, Vec<Command>>>();

    let mut stack = vec![root];
    while let Some(mut group) = stack.pop() {
        let mut by_command: BTreeMap<Command, Vec<Image>> = BTreeMap::new();
        for (i, cmds) in group.iter() {
            for c in cmds {
                by_command.entry(*c).or_default().push(*i);
            }
        }

        let mut best: Option<(Command, f64)> = None;
        for (c, images) in by_command.iter() {
            let s = score(*c, images.len());
            if best.map_or(true, |(_, b)| s > b) {
                best = Some((*c, s));
            }
        }
        let Some((command, _)) = best else { continue };

        let mut took = BTreeMap::new();
        for i in by_command[&command].iter() {
            schedule.push(*i, command);
            if let Some(mut left) = group.remove(i) {
                left.retain(|c| *c != command);
                if !left.is_empty() {
                    took.insert(*i, left);
                }
            }
        }
        if !group.is_empty() {
            stack.push(group);
        }
        if !took.is_empty() {
            stack.push(took);
        }
    }
    schedule
}

#[cfg(test)]
mod tests {
    use crate::{Problem, Command};

    use super::greedy_schedule;

    #[test]
    fn every_image_gets_a_permutation_of_its_commands() {
        let pb = Problem::generate(12, 15, 10.0, 3).unwrap();
        let schedule = greedy_schedule(&pb, |_, n| n as f64);
        assert!(schedule.validate(&pb).is_ok());
    }
    #[test]
    fn ties_favor_the_smallest_command() {
        let pb = Problem::new([("A", 1.0), ("B", 1.0)], [("1", vec!["B", "A"])]).unwrap();
        let schedule = greedy_schedule(&pb, |_, _| 0.0);
        assert_eq!(&[Command(0), Command(1)], schedule.order(pb.image("1").unwrap()));
    }
}
