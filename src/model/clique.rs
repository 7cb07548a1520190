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

//! This module defines the `Clique` structure. A clique is a group of images
//! which all share a common set of commands: these commands can be run once
//! and their result (the image prefix) reused by all the images of the group.
//!
//! Cliques can be nested. A clique built on the residual commands of another
//! clique (its parent) must come after that parent in the schedule of its
//! images.

use std::{
    cmp::Ordering,
    collections::BTreeMap,
    hash::{Hash, Hasher},
    sync::Arc,
};

use crate::{Command, Cost, Image, Problem};

use super::problem::{difference, intersection};

/// The structural identity of a clique: its images, its commands and the
/// identity of its parent (if any). Two cliques with the same key are the
/// same clique.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CliqueKey {
    pub parent: Option<Box<CliqueKey>>,
    pub images: Vec<Image>,
    pub commands: Vec<Command>,
}

/// A group of images sharing a set of commands
#[derive(Debug, Clone)]
pub struct Clique {
    images: Vec<Image>,
    commands: Vec<Command>,
    parent: Option<Arc<Clique>>,
    /// For each image, the commands that remain to be run after this clique
    /// (and all its ancestors). Images with nothing left are absent.
    remaining: BTreeMap<Image, Vec<Command>>,
    /// The union of all remaining commands
    remaining_commands: Vec<Command>,
    cost: Cost,
    key: CliqueKey,
}

impl Clique {
    /// Creates a new clique. Images and commands are sorted and deduplicated.
    pub fn new(problem: &Problem, images: Vec<Image>, commands: Vec<Command>, parent: Option<Arc<Clique>>) -> Self {
        let mut images = images;
        images.sort_unstable();
        images.dedup();
        let mut commands = commands;
        commands.sort_unstable();
        commands.dedup();

        let mut remaining = BTreeMap::new();
        for &i in images.iter() {
            let left = match &parent {
                Some(p) => difference(p.remaining_of(i), &commands),
                None    => difference(problem.commands_of(i), &commands),
            };
            if !left.is_empty() {
                remaining.insert(i, left);
            }
        }
        let mut remaining_commands = remaining.values().flatten().copied().collect::<Vec<_>>();
        remaining_commands.sort_unstable();
        remaining_commands.dedup();

        let key = CliqueKey {
            parent: parent.as_ref().map(|p| Box::new(p.key.clone())),
            images: images.clone(),
            commands: commands.clone(),
        };
        let cost = problem.cost_of(&commands);

        Clique { images, commands, parent, remaining, remaining_commands, cost, key }
    }

    /// The trivial clique: one image running one command on its own
    pub fn singleton(problem: &Problem, image: Image, command: Command) -> Self {
        Self::new(problem, vec![image], vec![command], None)
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
    pub fn parent(&self) -> Option<&Arc<Clique>> {
        self.parent.as_ref()
    }
    pub fn key(&self) -> &CliqueKey {
        &self.key
    }
    /// The cost of running the commands of this clique once
    pub fn cost(&self) -> Cost {
        self.cost
    }
    /// The number of (image, command) pairs covered by this clique
    pub fn size(&self) -> usize {
        self.images.len() * self.commands.len()
    }
    pub fn remaining(&self) -> &BTreeMap<Image, Vec<Command>> {
        &self.remaining
    }
    /// The commands the given image still has to run after this clique
    pub fn remaining_of(&self, image: Image) -> &[Command] {
        self.remaining.get(&image).map(|v| v.as_slice()).unwrap_or(&[])
    }
    pub fn remaining_commands(&self) -> &[Command] {
        &self.remaining_commands
    }
    pub fn has_image(&self, image: Image) -> bool {
        self.images.binary_search(&image).is_ok()
    }
    pub fn has_command(&self, command: Command) -> bool {
        self.commands.binary_search(&command).is_ok()
    }
    /// True iff this clique runs `command` for `image`
    pub fn covers(&self, image: Image, command: Command) -> bool {
        self.has_image(image) && self.has_command(command)
    }
    /// True iff this clique does not group several images
    pub fn is_singleton(&self) -> bool {
        self.images.len() < 2
    }
    /// The number of ancestors of this clique
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent.as_ref();
        while let Some(p) = current {
            depth += 1;
            current = p.parent.as_ref();
        }
        depth
    }
    /// True iff this clique appears in the parent chain of `other`
    pub fn is_ancestor_of(&self, other: &Clique) -> bool {
        let mut current = other.parent.as_ref();
        while let Some(p) = current {
            if p.key == self.key {
                return true;
            }
            current = p.parent.as_ref();
        }
        false
    }
    /// True iff all images of this clique require all of its commands
    pub fn is_consistent(&self, problem: &Problem) -> bool {
        !self.images.is_empty()
            && !self.commands.is_empty()
            && self.images.iter().all(|i| self.commands.iter().all(|c| problem.requires(*i, *c)))
    }
    /// Returns true when this clique and `other` cannot both be part of a
    /// schedule. Two cliques with a common image must have nested image sets
    /// (unless one descends from the other). When `disjoint_rule` is set, two
    /// multi-image cliques on disjoint images must also run disjoint commands.
    pub fn conflicts_with(&self, other: &Clique, disjoint_rule: bool) -> bool {
        if self.key == other.key || self.is_ancestor_of(other) || other.is_ancestor_of(self) {
            return false;
        }
        let common = intersection(&self.images, &other.images);
        if common.is_empty() {
            disjoint_rule
                && !self.is_singleton()
                && !other.is_singleton()
                && !intersection(&self.commands, &other.commands).is_empty()
        } else {
            common.len() < self.images.len() && common.len() < other.images.len()
        }
    }
    /// A human readable name such as `{1 2, A B}`. Nested cliques are
    /// prefixed with the name of their parent: `{1 2 3, B}->{2 3, C D}`.
    pub fn label(&self, problem: &Problem) -> String {
        let images = self.images.iter().map(|i| problem.image_name(*i)).collect::<Vec<_>>().join(" ");
        let commands = self.commands.iter().map(|c| problem.command_name(*c)).collect::<Vec<_>>().join(" ");
        let me = format!("{{{images}, {commands}}}");
        match &self.parent {
            Some(p) => format!("{}->{}", p.label(problem), me),
            None    => me,
        }
    }
}

impl PartialEq for Clique {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}
impl Eq for Clique {}
impl Hash for Clique {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}
impl PartialOrd for Clique {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Clique {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{Clique, Command, Image, Problem};

    fn example() -> Problem {
        Problem::new(
            [("A", 5.0), ("B", 10.0), ("C", 7.0), ("D", 12.0)],
            [("1", vec!["A", "B"]), ("2", vec!["A", "B", "C", "D"]), ("3", vec!["B", "C", "D"])],
        ).unwrap()
    }
    fn ids(pb: &Problem, images: &[&str], commands: &[&str]) -> (Vec<Image>, Vec<Command>) {
        (
            images.iter().map(|i| pb.image(i).unwrap()).collect(),
            commands.iter().map(|c| pb.command(c).unwrap()).collect(),
        )
    }

    #[test]
    fn images_and_commands_are_sorted() {
        let pb = example();
        let (i, c) = ids(&pb, &["3", "2"], &["D", "C", "D"]);
        let k = Clique::new(&pb, i, c, None);
        assert_eq!(&[Image(1), Image(2)], k.images());
        assert_eq!(&[Command(2), Command(3)], k.commands());
        assert_eq!(19.0, k.cost());
        assert_eq!(4, k.size());
        assert_eq!("{2 3, C D}", k.label(&pb));
    }
    #[test]
    fn remaining_commands_are_relative_to_the_parent() {
        let pb = example();
        let (i, c) = ids(&pb, &["1", "2", "3"], &["B"]);
        let root = Arc::new(Clique::new(&pb, i, c, None));
        assert_eq!(None, root.remaining().get(&Image(9)));
        assert_eq!(&[Command(0)], root.remaining_of(Image(0)));
        assert_eq!(&[Command(0), Command(2), Command(3)], root.remaining_of(Image(1)));
        assert_eq!(&[Command(0), Command(2), Command(3)], root.remaining_commands());

        let (i, c) = ids(&pb, &["2", "3"], &["C", "D"]);
        let child = Clique::new(&pb, i, c, Some(root.clone()));
        assert_eq!(&[Command(0)], child.remaining_of(Image(1)));
        assert!(child.remaining_of(Image(2)).is_empty());
        assert!(!child.remaining().contains_key(&Image(2)));
        assert_eq!(1, child.depth());
        assert!(root.is_ancestor_of(&child));
        assert!(!child.is_ancestor_of(&root));
        assert_eq!("{1 2 3, B}->{2 3, C D}", child.label(&pb));
    }
    #[test]
    fn identity_includes_the_parent() {
        let pb = example();
        let (i, c) = ids(&pb, &["1", "2", "3"], &["B"]);
        let root = Arc::new(Clique::new(&pb, i, c, None));
        let (i, c) = ids(&pb, &["2", "3"], &["C", "D"]);
        let orphan = Clique::new(&pb, i.clone(), c.clone(), None);
        let child = Clique::new(&pb, i.clone(), c.clone(), Some(root));
        assert_ne!(orphan, child);
        assert_eq!(orphan, Clique::new(&pb, i, c, None));
    }
    #[test]
    fn consistency_requires_every_pair_to_be_needed() {
        let pb = example();
        let (i, c) = ids(&pb, &["1", "2"], &["A", "B"]);
        assert!(Clique::new(&pb, i, c, None).is_consistent(&pb));
        let (i, c) = ids(&pb, &["1", "3"], &["C"]);
        assert!(!Clique::new(&pb, i, c, None).is_consistent(&pb));
    }
    #[test]
    fn partial_image_overlaps_conflict() {
        let pb = example();
        let (i, c) = ids(&pb, &["1", "2"], &["A"]);
        let a = Clique::new(&pb, i, c, None);
        let (i, c) = ids(&pb, &["2", "3"], &["C", "D"]);
        let b = Clique::new(&pb, i, c, None);
        assert!(a.conflicts_with(&b, false));
        assert!(b.conflicts_with(&a, false));
    }
    #[test]
    fn nested_image_sets_do_not_conflict() {
        let pb = example();
        let (i, c) = ids(&pb, &["1", "2", "3"], &["B"]);
        let a = Clique::new(&pb, i, c, None);
        let (i, c) = ids(&pb, &["2", "3"], &["C", "D"]);
        let b = Clique::new(&pb, i, c, None);
        assert!(!a.conflicts_with(&b, true));
        let s = Clique::singleton(&pb, Image(0), Command(0));
        assert!(!a.conflicts_with(&s, true));
    }
    #[test]
    fn disjoint_images_conflict_only_under_the_disjoint_rule() {
        let pb = Problem::new(
            [("A", 1.0), ("B", 1.0)],
            [("1", vec!["A"]), ("2", vec!["A"]), ("3", vec!["A", "B"]), ("4", vec!["A", "B"])],
        ).unwrap();
        let (i, c) = ids(&pb, &["1", "2"], &["A"]);
        let a = Clique::new(&pb, i, c, None);
        let (i, c) = ids(&pb, &["3", "4"], &["A", "B"]);
        let b = Clique::new(&pb, i, c, None);
        assert!(!a.conflicts_with(&b, false));
        assert!(a.conflicts_with(&b, true));
    }
}
