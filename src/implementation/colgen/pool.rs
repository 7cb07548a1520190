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

//! This module defines the pool of cliques (columns) over which the master
//! problem is solved. The pool only ever grows.

use std::{collections::BTreeMap, sync::Arc};

use fxhash::FxHashMap;

use crate::{Clique, CliqueKey, Command, Image, Problem, Schedule};

/// The set of cliques known so far, indexed by the (image, command) pairs
/// they cover.
#[derive(Debug, Clone, Default)]
pub struct CliquePool {
    cliques: Vec<Arc<Clique>>,
    index: FxHashMap<CliqueKey, usize>,
    by_pair: FxHashMap<(Image, Command), Vec<usize>>,
    /// Explicit groups of mutually exclusive cliques
    groups: Vec<Vec<usize>>,
}

impl CliquePool {
    /// Creates a pool holding one singleton clique per (image, command) pair.
    /// Covering every pair with its singleton is always feasible.
    pub fn new(problem: &Problem) -> Self {
        let mut pool = Self::default();
        for i in problem.images() {
            for c in problem.commands_of(i) {
                pool.insert(Arc::new(Clique::singleton(problem, i, *c)));
            }
        }
        pool
    }

    pub fn len(&self) -> usize {
        self.cliques.len()
    }
    pub fn is_empty(&self) -> bool {
        self.cliques.is_empty()
    }
    pub fn get(&self, index: usize) -> &Arc<Clique> {
        &self.cliques[index]
    }
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Clique>> {
        self.cliques.iter()
    }
    /// The position of the given clique in the pool
    pub fn index_of(&self, key: &CliqueKey) -> Option<usize> {
        self.index.get(key).copied()
    }
    pub fn contains(&self, clique: &Clique) -> bool {
        self.index.contains_key(clique.key())
    }
    /// The cliques covering `command` for `image`
    pub fn covering(&self, image: Image, command: Command) -> &[usize] {
        self.by_pair.get(&(image, command)).map(|v| v.as_slice()).unwrap_or(&[])
    }
    /// The cliques grouping several images
    pub fn shared(&self) -> impl Iterator<Item = (usize, &Arc<Clique>)> {
        self.cliques.iter().enumerate().filter(|(_, c)| !c.is_singleton())
    }
    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    /// Adds a clique to the pool (along with its ancestors when they are
    /// missing). Returns the position of the new clique, or None when it was
    /// already part of the pool.
    pub fn insert(&mut self, clique: Arc<Clique>) -> Option<usize> {
        if self.contains(&clique) {
            return None;
        }
        if let Some(parent) = clique.parent() {
            self.insert(Arc::clone(parent));
        }
        let idx = self.cliques.len();
        for i in clique.images() {
            for c in clique.commands() {
                self.by_pair.entry((*i, *c)).or_default().push(idx);
            }
        }
        self.index.insert(clique.key().clone(), idx);
        self.cliques.push(clique);
        Some(idx)
    }

    /// Declares that at most one of the given cliques may be selected
    pub fn add_group(&mut self, group: Vec<usize>) {
        if group.len() > 1 {
            self.groups.push(group);
        }
    }

    /// Adds one clique per command shared by several images: all the images
    /// requiring that command run it once. Returns the number of new cliques.
    pub fn seed_shared_commands(&mut self, problem: &Problem) -> usize {
        let mut added = 0;
        for c in problem.commands() {
            let images = problem.images_requiring(c);
            if images.len() > 1 && self.insert(Arc::new(Clique::new(problem, images.to_vec(), vec![c], None))).is_some() {
                added += 1;
            }
        }
        added
    }

    /// Adds the cliques corresponding to the prefixes shared by several images
    /// in the given schedule. Each shared prefix yields the clique made of its
    /// images and of its last command. Returns the number of new cliques.
    pub fn warm_start(&mut self, problem: &Problem, schedule: &Schedule) -> usize {
        let mut prefixes: BTreeMap<&[Command], Vec<Image>> = BTreeMap::new();
        for (image, order) in schedule.iter() {
            for k in 1..=order.len() {
                prefixes.entry(&order[..k]).or_default().push(image);
            }
        }
        let mut added = 0;
        for (prefix, images) in prefixes {
            if images.len() < 2 {
                continue;
            }
            if let Some(last) = prefix.last() {
                let clique = Clique::new(problem, images, vec![*last], None);
                if clique.is_consistent(problem) && self.insert(Arc::new(clique)).is_some() {
                    added += 1;
                }
            }
        }
        added
    }

    /// Lists the pairs of cliques which cannot be selected together
    pub fn conflicts(&self, disjoint_rule: bool) -> Vec<(usize, usize)> {
        let shared = self.shared().collect::<Vec<_>>();
        let mut out = vec![];
        for (x, (a, ca)) in shared.iter().enumerate() {
            for (b, cb) in shared[x + 1..].iter() {
                if ca.conflicts_with(cb, disjoint_rule) {
                    out.push((*a, *b));
                }
            }
        }
        out
    }
}
