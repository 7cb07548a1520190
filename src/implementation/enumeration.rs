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

//! This module implements the recursive enumeration of the maximal cliques of
//! a DICP instance.
//!
//! The instance is seen as a graph whose vertices are the images and the
//! commands. Any two images are adjacent, any two commands are adjacent, and an
//! image is adjacent to a command iff it requires that command. A maximal
//! clique of that graph which comprises at least two images and one command is
//! a maximal group of images sharing a maximal set of commands.
//!
//! Each such clique spanning more than two images is refined by running the
//! same enumeration on the commands its images still have to run: these are
//! the commands which could be shared further down the clique.

use std::{collections::{BTreeMap, BTreeSet}, sync::Arc};

use bit_set::BitSet;
use fxhash::FxHashMap;
use log::debug;
use serde_json::{json, Value};

use crate::{Clique, Command, Cost, Image, Problem};

use crate::model::difference;

/// One maximal clique found by the enumeration, along with its refinements
#[derive(Debug, Clone, PartialEq)]
pub struct CliqueRecord {
    /// A unique name. Nested cliques are prefixed with the name of their parent
    pub name: String,
    /// The cost of the shared commands
    pub time: Cost,
    pub images: Vec<Image>,
    pub commands: Vec<Command>,
    /// The cliques found among the commands left after this one
    pub children: CliqueTree,
}

/// The forest of cliques discovered at one level of the enumeration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliqueTree {
    pub cliques: Vec<CliqueRecord>,
    /// Groups of (at least two) cliques of this level which touch a common
    /// image. At most one clique of each group can be selected.
    pub intersections: Vec<Vec<String>>,
}

/// The cliques of a tree flattened into a list, ready to be used as columns
#[derive(Debug, Clone, Default)]
pub struct FlatCliques {
    /// The cliques in depth first order. Nested cliques point to their parent.
    pub cliques: Vec<Arc<Clique>>,
    /// The intersection groups, as indices in `cliques`
    pub groups: Vec<Vec<usize>>,
}

impl CliqueTree {
    /// The total number of cliques in this tree (all levels included)
    pub fn len(&self) -> usize {
        self.cliques.iter().map(|c| 1 + c.children.len()).sum()
    }
    pub fn is_empty(&self) -> bool {
        self.cliques.is_empty()
    }
    /// The deepest level of nesting in this tree (0 when empty)
    pub fn depth(&self) -> usize {
        self.cliques.iter().map(|c| 1 + c.children.depth()).max().unwrap_or(0)
    }

    /// Flattens the tree into `Clique`s whose parent links mirror the tree
    pub fn to_cliques(&self, problem: &Problem) -> FlatCliques {
        let mut flat = FlatCliques::default();
        self.flatten_into(problem, None, &mut flat);
        flat
    }
    fn flatten_into(&self, problem: &Problem, parent: Option<Arc<Clique>>, flat: &mut FlatCliques) {
        let mut index_of = FxHashMap::default();
        for rec in self.cliques.iter() {
            let clique = Arc::new(Clique::new(problem, rec.images.clone(), rec.commands.clone(), parent.clone()));
            index_of.insert(rec.name.as_str(), flat.cliques.len());
            flat.cliques.push(Arc::clone(&clique));
            rec.children.flatten_into(problem, Some(clique), flat);
        }
        for group in self.intersections.iter() {
            let group = group.iter().filter_map(|n| index_of.get(n.as_str()).copied()).collect::<Vec<_>>();
            if group.len() > 1 {
                flat.groups.push(group);
            }
        }
    }

    /// A json view of this tree (using the names of images and commands)
    pub fn to_json(&self, problem: &Problem) -> Value {
        let cliques = self.cliques.iter()
            .map(|c| json!({
                "name": c.name,
                "time": c.time,
                "images": c.images.iter().map(|i| problem.image_name(*i)).collect::<Vec<_>>(),
                "commands": c.commands.iter().map(|x| problem.command_name(*x)).collect::<Vec<_>>(),
                "children": c.children.to_json(problem),
            }))
            .collect::<Vec<_>>();
        json!({ "cliques": cliques, "intersections": self.intersections })
    }
}

/// Enumerates the (nested) maximal cliques of a problem
pub struct CliqueEnumerator<'a> {
    problem: &'a Problem,
}

impl <'a> CliqueEnumerator<'a> {
    pub fn new(problem: &'a Problem) -> Self {
        Self { problem }
    }

    /// Enumerates the clique tree of the whole problem. The result only
    /// depends on the problem (not on any hashing or allocation order).
    pub fn enumerate(&self) -> CliqueTree {
        let residual = self.problem.images()
            .map(|i| (i, self.problem.commands_of(i).to_vec()))
            .filter(|(_, cmds)| !cmds.is_empty())
            .collect::<BTreeMap<_, _>>();
        self.enumerate_residual(&residual, None)
    }

    fn enumerate_residual(&self, residual: &BTreeMap<Image, Vec<Command>>, parent: Option<&str>) -> CliqueTree {
        let found = maximal_cliques(residual);
        debug!("{} maximal cliques under {}", found.len(), parent.unwrap_or("the root"));

        let mut tree = CliqueTree::default();
        let mut by_image: BTreeMap<Image, Vec<String>> = BTreeMap::new();
        for (images, commands) in found {
            let label = self.label(&images, &commands);
            let name = match parent {
                Some(p) => format!("{p}->{label}"),
                None    => label,
            };
            for i in images.iter() {
                by_image.entry(*i).or_default().push(name.clone());
            }

            let mut children = CliqueTree::default();
            if images.len() > 2 {
                let sub = images.iter()
                    .map(|i| (*i, difference(residual.get(i).map(|v| v.as_slice()).unwrap_or(&[]), &commands)))
                    .filter(|(_, cmds)| !cmds.is_empty())
                    .collect::<BTreeMap<_, _>>();
                if sub.len() > 1 {
                    children = self.enumerate_residual(&sub, Some(&name));
                }
            }

            tree.cliques.push(CliqueRecord {
                name,
                time: self.problem.cost_of(&commands),
                images,
                commands,
                children,
            });
        }

        let groups = by_image.into_values()
            .filter(|g| g.len() > 1)
            .collect::<BTreeSet<_>>();
        tree.intersections = groups.into_iter().collect();
        tree
    }

    fn label(&self, images: &[Image], commands: &[Command]) -> String {
        let images = images.iter().map(|i| self.problem.image_name(*i)).collect::<Vec<_>>().join(" ");
        let commands = commands.iter().map(|c| self.problem.command_name(*c)).collect::<Vec<_>>().join(" ");
        format!("{{{images}, {commands}}}")
    }
}

/// Finds all the maximal (images, commands) bicliques of the residual problem
/// having at least two images and one command. The result is sorted.
fn maximal_cliques(residual: &BTreeMap<Image, Vec<Command>>) -> Vec<(Vec<Image>, Vec<Command>)> {
    let images = residual.keys().copied().collect::<Vec<_>>();
    let mut commands = residual.values().flatten().copied().collect::<Vec<_>>();
    commands.sort_unstable();
    commands.dedup();

    // vertices 0..n are images, n..n+m are commands
    let n = images.len();
    let m = commands.len();
    let mut adjacency = vec![BitSet::with_capacity(n + m); n + m];
    for a in 0..n {
        for b in 0..n {
            if a != b {
                adjacency[a].insert(b);
            }
        }
    }
    for a in 0..m {
        for b in 0..m {
            if a != b {
                adjacency[n + a].insert(n + b);
            }
        }
    }
    for (a, image) in images.iter().enumerate() {
        for cmd in residual[image].iter() {
            if let Ok(b) = commands.binary_search(cmd) {
                adjacency[a].insert(n + b);
                adjacency[n + b].insert(a);
            }
        }
    }

    let mut found = vec![];
    let candidates = (0..n + m).collect::<BitSet>();
    bron_kerbosch(&adjacency, &mut vec![], candidates, BitSet::with_capacity(n + m), &mut found);

    let mut out = found.into_iter()
        .map(|clique| {
            let imgs = clique.iter().filter(|v| **v < n).map(|v| images[*v]).collect::<Vec<_>>();
            let cmds = clique.iter().filter(|v| **v >= n).map(|v| commands[*v - n]).collect::<Vec<_>>();
            (imgs, cmds)
        })
        .filter(|(imgs, cmds)| imgs.len() > 1 && !cmds.is_empty())
        .collect::<Vec<_>>();
    for (imgs, cmds) in out.iter_mut() {
        imgs.sort_unstable();
        cmds.sort_unstable();
    }
    out.sort_unstable();
    out
}

/// Bron-Kerbosch with pivoting: reports every maximal clique extending `r`
/// with vertices of `p` and none of `x`.
fn bron_kerbosch(adjacency: &[BitSet], r: &mut Vec<usize>, mut p: BitSet, mut x: BitSet, out: &mut Vec<Vec<usize>>) {
    if p.is_empty() {
        if x.is_empty() {
            out.push(r.clone());
        }
        return;
    }
    // the pivot is the vertex with the most neighbors among the candidates
    let pivot = p.union(&x)
        .max_by_key(|u| (p.intersection(&adjacency[*u]).count(), usize::MAX - u))
        .unwrap_or(0);

    let branches = p.difference(&adjacency[pivot]).collect::<Vec<_>>();
    for v in branches {
        let mut p_v = p.clone();
        p_v.intersect_with(&adjacency[v]);
        let mut x_v = x.clone();
        x_v.intersect_with(&adjacency[v]);

        r.push(v);
        bron_kerbosch(adjacency, r, p_v, x_v, out);
        r.pop();

        p.remove(v);
        x.insert(v);
    }
}

#[cfg(test)]
mod tests {
    use crate::{CliqueEnumerator, Command, Image, Problem};

    fn example() -> Problem {
        Problem::new(
            [("A", 5.0), ("B", 10.0), ("C", 7.0), ("D", 12.0)],
            [("1", vec!["A", "B"]), ("2", vec!["A", "B", "C", "D"]), ("3", vec!["B", "C", "D"])],
        ).unwrap()
    }

    #[test]
    fn finds_the_maximal_cliques_of_the_example() {
        let pb = example();
        let tree = CliqueEnumerator::new(&pb).enumerate();
        let names = tree.cliques.iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
        assert_eq!(vec!["{1 2, A B}", "{1 2 3, B}", "{2 3, B C D}"], names);
        assert_eq!(15.0, tree.cliques[0].time);
        assert_eq!(10.0, tree.cliques[1].time);
        assert_eq!(29.0, tree.cliques[2].time);
    }
    #[test]
    fn cliques_with_more_than_two_images_are_refined() {
        let pb = example();
        let tree = CliqueEnumerator::new(&pb).enumerate();
        assert!(tree.cliques[0].children.is_empty());
        assert!(tree.cliques[2].children.is_empty());

        let children = &tree.cliques[1].children;
        let names = children.cliques.iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
        assert_eq!(vec!["{1 2 3, B}->{1 2, A}", "{1 2 3, B}->{2 3, C D}"], names);
        assert_eq!(vec![vec!["{1 2 3, B}->{1 2, A}".to_string(), "{1 2 3, B}->{2 3, C D}".to_string()]], children.intersections);
        assert_eq!(5, tree.len());
        assert_eq!(2, tree.depth());
    }
    #[test]
    fn intersections_group_cliques_touching_the_same_image() {
        let pb = example();
        let tree = CliqueEnumerator::new(&pb).enumerate();
        // image 1 is in the first two, image 2 in all three, image 3 in the last two
        assert_eq!(3, tree.intersections.len());
        assert!(tree.intersections.iter().any(|g| g.len() == 3));
        for group in tree.intersections.iter() {
            assert!(group.iter().all(|n| !n.contains("->")));
        }
    }
    #[test]
    fn enumeration_is_deterministic() {
        let pb = example();
        let a = CliqueEnumerator::new(&pb).enumerate();
        let b = CliqueEnumerator::new(&pb).enumerate();
        assert_eq!(a, b);
    }
    #[test]
    fn no_sharing_means_no_clique() {
        let pb = Problem::new([("A", 1.0), ("B", 2.0)], [("1", vec!["A"]), ("2", vec!["B"])]).unwrap();
        let tree = CliqueEnumerator::new(&pb).enumerate();
        assert!(tree.is_empty());
        assert!(tree.intersections.is_empty());
        assert_eq!(0, tree.depth());
    }
    #[test]
    fn every_clique_is_consistent_with_the_problem() {
        let pb = Problem::generate(8, 12, 20.0, 7).unwrap();
        let tree = CliqueEnumerator::new(&pb).enumerate();
        let flat = tree.to_cliques(&pb);
        assert_eq!(tree.len(), flat.cliques.len());
        for clique in flat.cliques.iter() {
            assert!(clique.is_consistent(&pb));
            assert!(clique.images().len() >= 2);
            if let Some(parent) = clique.parent() {
                assert!(clique.images().iter().all(|i| parent.has_image(*i)));
                assert!(clique.commands().iter().all(|c| !parent.has_command(*c)));
            }
        }
    }
    #[test]
    fn flattening_keeps_parents_and_groups() {
        let pb = example();
        let flat = CliqueEnumerator::new(&pb).enumerate().to_cliques(&pb);
        assert_eq!(5, flat.cliques.len());
        // {1 2 3, B} comes second, directly followed by its children
        assert_eq!(&[Image(0), Image(1), Image(2)], flat.cliques[1].images());
        assert!(flat.cliques[1].is_ancestor_of(&flat.cliques[2]));
        assert!(flat.cliques[1].is_ancestor_of(&flat.cliques[3]));
        assert_eq!(&[Command(2), Command(3)], flat.cliques[3].commands());
        assert!(flat.groups.contains(&vec![2, 3]));
        assert!(flat.groups.contains(&vec![0, 1, 4]));
    }
    #[test]
    fn json_view_uses_names() {
        let pb = example();
        let json = CliqueEnumerator::new(&pb).enumerate().to_json(&pb);
        assert_eq!("{1 2, A B}", json["cliques"][0]["name"].as_str().unwrap());
        assert_eq!("A", json["cliques"][0]["commands"][0].as_str().unwrap());
        assert_eq!(2, json["cliques"][1]["children"]["cliques"].as_array().unwrap().len());
    }
}
