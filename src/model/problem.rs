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

//! This module defines the `Problem` structure: an instance of the Docker
//! Image Construction Problem. A problem consists of a set of commands (each
//! with an execution cost) and a set of images, each of which requires some
//! of these commands to be run (in any order) in order to be built.
//!
//! The problem is immutable once constructed. All the derived views (the
//! stages of each image, the commands shared by any two images, the images
//! requiring a given command) are computed once at construction time.

use std::{collections::BTreeMap, fs, ops::RangeInclusive, path::Path};

use fxhash::FxHashMap;
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Exp, Poisson};

use crate::{Command, Cost, Error, Image};

use super::io::ProblemFile;

/// An instance of the DICP
#[derive(Debug, Clone)]
pub struct Problem {
    /// The name of each command (sorted)
    command_names: Vec<String>,
    /// The cost of each command
    costs: Vec<Cost>,
    /// The name of each image (sorted)
    image_names: Vec<String>,
    /// The (sorted) commands required by each image
    images: Vec<Vec<Command>>,
    /// The (sorted) images requiring each command
    by_command: Vec<Vec<Image>>,
    /// The commands shared by any two images `(a, b)` with `a < b`. Pairs
    /// sharing nothing are absent from this map.
    shared: FxHashMap<(Image, Image), Vec<Command>>,
    /// Reverse lookup of the command names
    command_ids: FxHashMap<String, Command>,
    /// Reverse lookup of the image names
    image_ids: FxHashMap<String, Image>,
    /// The largest number of commands required by one image
    max_stages: usize,
}

impl Problem {
    /// Creates a new problem from a cost map and a map associating each image
    /// with the commands it requires.
    ///
    /// # Errors
    /// This function returns a `MalformedInstance` error when either map is
    /// empty, when a name is defined twice, when a cost is negative (or not a
    /// number), when an image references an unknown command or when it lists
    /// the same command twice.
    ///
    /// # Example
    /// ```
    /// # use dicp::*;
    /// let problem = Problem::new(
    ///     [("A", 5.0), ("B", 10.0)],
    ///     [("1", vec!["A", "B"]), ("2", vec!["B"])],
    /// ).unwrap();
    /// assert_eq!(2, problem.nb_images());
    /// assert_eq!(25.0, problem.trivial_cost());
    /// ```
    pub fn new<C, K, I, N, V, S>(commands: C, images: I) -> Result<Self, Error>
    where
        C: IntoIterator<Item = (K, Cost)>,
        K: Into<String>,
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut command_map = BTreeMap::new();
        for (name, cost) in commands {
            let name = name.into();
            if command_map.insert(name.clone(), cost).is_some() {
                return Err(Error::MalformedInstance(format!("command {name} is defined twice")));
            }
        }
        let mut image_map = BTreeMap::new();
        for (name, cmds) in images {
            let name = name.into();
            let cmds = cmds.into_iter().map(Into::into).collect::<Vec<String>>();
            if image_map.insert(name.clone(), cmds).is_some() {
                return Err(Error::MalformedInstance(format!("image {name} is defined twice")));
            }
        }
        Self::from_maps(command_map, image_map)
    }

    fn from_maps(commands: BTreeMap<String, Cost>, images: BTreeMap<String, Vec<String>>) -> Result<Self, Error> {
        if commands.is_empty() {
            return Err(Error::MalformedInstance("the instance defines no command".to_string()));
        }
        if images.is_empty() {
            return Err(Error::MalformedInstance("the instance defines no image".to_string()));
        }
        for (name, cost) in commands.iter() {
            if !cost.is_finite() || *cost < 0.0 {
                return Err(Error::MalformedInstance(format!("command {name} has an invalid cost ({cost})")));
            }
        }

        let command_names = commands.keys().cloned().collect::<Vec<_>>();
        let costs = commands.values().copied().collect::<Vec<_>>();
        let command_ids = command_names.iter().enumerate()
            .map(|(i, name)| (name.clone(), Command(i)))
            .collect::<FxHashMap<_, _>>();

        let image_names = images.keys().cloned().collect::<Vec<_>>();
        let image_ids = image_names.iter().enumerate()
            .map(|(i, name)| (name.clone(), Image(i)))
            .collect::<FxHashMap<_, _>>();

        let mut required = Vec::with_capacity(images.len());
        let mut by_command = vec![vec![]; command_names.len()];
        for (i, (name, cmds)) in images.iter().enumerate() {
            let mut ids = Vec::with_capacity(cmds.len());
            for c in cmds.iter() {
                let id = command_ids.get(c).copied().ok_or_else(|| 
                    Error::MalformedInstance(format!("image {name} references unknown command {c}")))?;
                ids.push(id);
            }
            ids.sort_unstable();
            let before = ids.len();
            ids.dedup();
            if ids.len() != before {
                return Err(Error::MalformedInstance(format!("image {name} lists the same command twice")));
            }
            for c in ids.iter() {
                by_command[c.id()].push(Image(i));
            }
            required.push(ids);
        }

        let mut shared = FxHashMap::default();
        for a in 0..required.len() {
            for b in (a + 1)..required.len() {
                let common = intersection(&required[a], &required[b]);
                if !common.is_empty() {
                    shared.insert((Image(a), Image(b)), common);
                }
            }
        }
        let max_stages = required.iter().map(|cmds| cmds.len()).max().unwrap_or(0);

        Ok(Problem {
            command_names,
            costs,
            image_names,
            images: required,
            by_command,
            shared,
            command_ids,
            image_ids,
            max_stages,
        })
    }

    /// Generates a random instance of the DICP. The cost of each command is
    /// drawn from an exponential distribution of mean `max_time` (rounded up)
    /// and each image requires a number of distinct commands drawn from a
    /// poisson distribution of mean `nb_commands / 4`.
    ///
    /// # Errors
    /// `max_time` must be a positive (finite) number.
    pub fn generate(nb_images: usize, nb_commands: usize, max_time: f64, seed: u64) -> Result<Self, Error> {
        let exp = Exp::new(1.0 / max_time)
            .ok()
            .filter(|_| max_time.is_finite() && max_time > 0.0)
            .ok_or_else(|| Error::Config(format!("the mean command time must be positive (got {max_time})")))?;
        let lambda = nb_commands as f64 / 4.0;
        let poisson = if lambda > 0.0 {
            Some(Poisson::new(lambda).map_err(|e| Error::Config(format!("cannot draw image sizes: {e}")))?)
        } else {
            None
        };

        let mut rng = StdRng::seed_from_u64(seed);
        let img_width = nb_images.to_string().len();
        let cmd_width = nb_commands.to_string().len();

        let commands = (1..=nb_commands)
            .map(|c| (format!("{:0width$}", c, width = cmd_width), exp.sample(&mut rng).ceil()))
            .collect::<Vec<(String, Cost)>>();

        let images = (1..=nb_images)
            .map(|i| {
                let drawn: f64 = poisson.as_ref().map(|p| p.sample(&mut rng)).unwrap_or(0.0);
                let size = (drawn as usize).min(nb_commands);
                let mut picked = rand::seq::index::sample(&mut rng, nb_commands, size).into_vec();
                picked.sort_unstable();
                let cmds = picked.into_iter().map(|c| commands[c].0.clone()).collect::<Vec<String>>();
                (format!("{:0width$}", i, width = img_width), cmds)
            })
            .collect::<Vec<_>>();

        Self::new(commands, images)
    }

    /// Parses a problem from its json representation
    pub fn from_json(text: &str) -> Result<Self, Error> {
        let file: ProblemFile = serde_json::from_str(text)?;
        Self::from_maps(file.commands, file.images)
    }
    /// Returns the json representation of this problem
    pub fn to_json(&self) -> Result<String, Error> {
        let file = ProblemFile {
            images: self.images().map(|i| {
                (self.image_name(i).to_string(), self.commands_of(i).iter().map(|c| self.command_name(*c).to_string()).collect())
            }).collect(),
            commands: self.commands().map(|c| (self.command_name(c).to_string(), self.cost(c))).collect(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }
    /// Loads an instance of the DICP from a json file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }
    /// Saves this instance to a json file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn nb_commands(&self) -> usize {
        self.command_names.len()
    }
    pub fn nb_images(&self) -> usize {
        self.image_names.len()
    }
    /// Iterates over all commands (in the order of their names)
    pub fn commands(&self) -> impl Iterator<Item = Command> {
        (0..self.nb_commands()).map(Command)
    }
    /// Iterates over all images (in the order of their names)
    pub fn images(&self) -> impl Iterator<Item = Image> {
        (0..self.nb_images()).map(Image)
    }
    pub fn cost(&self, command: Command) -> Cost {
        self.costs[command.id()]
    }
    /// The summed cost of the given commands
    pub fn cost_of(&self, commands: &[Command]) -> Cost {
        commands.iter().map(|c| self.cost(*c)).sum()
    }
    pub fn command_name(&self, command: Command) -> &str {
        &self.command_names[command.id()]
    }
    pub fn image_name(&self, image: Image) -> &str {
        &self.image_names[image.id()]
    }
    /// Looks a command up by its name
    pub fn command(&self, name: &str) -> Option<Command> {
        self.command_ids.get(name).copied()
    }
    /// Looks an image up by its name
    pub fn image(&self, name: &str) -> Option<Image> {
        self.image_ids.get(name).copied()
    }
    /// The (sorted) commands required by the given image
    pub fn commands_of(&self, image: Image) -> &[Command] {
        &self.images[image.id()]
    }
    /// The (sorted) images requiring the given command
    pub fn images_requiring(&self, command: Command) -> &[Image] {
        &self.by_command[command.id()]
    }
    /// True iff `image` requires `command`
    pub fn requires(&self, image: Image, command: Command) -> bool {
        self.commands_of(image).binary_search(&command).is_ok()
    }
    /// All the stages of the problem: `1..=max(|commands(i)|)`
    pub fn all_stages(&self) -> RangeInclusive<usize> {
        1..=self.max_stages
    }
    /// The stages of one image: `1..=|commands(image)|`
    pub fn stages(&self, image: Image) -> RangeInclusive<usize> {
        1..=self.commands_of(image).len()
    }
    /// The commands required by both `a` and `b`. The order of the arguments
    /// does not matter; the result is empty when nothing is shared.
    pub fn shared_commands(&self, a: Image, b: Image) -> &[Command] {
        let key = if a < b { (a, b) } else { (b, a) };
        self.shared.get(&key).map(|v| v.as_slice()).unwrap_or(&[])
    }
    /// The stages two images may share: `1..=|shared_commands(a, b)|`
    pub fn shared_stages(&self, a: Image, b: Image) -> RangeInclusive<usize> {
        1..=self.shared_commands(a, b).len()
    }
    /// Iterates over all pairs of images `(a, b)` with `a < b` that share at
    /// least one command, in a deterministic order.
    pub fn sharing_pairs(&self) -> impl Iterator<Item = (Image, Image, &[Command])> {
        let mut pairs = self.shared.iter().map(|((a, b), cmds)| (*a, *b, cmds.as_slice())).collect::<Vec<_>>();
        pairs.sort_unstable_by_key(|(a, b, _)| (*a, *b));
        pairs.into_iter()
    }
    /// The cost of the schedule where nothing is shared: every image runs all
    /// of its commands on its own.
    pub fn trivial_cost(&self) -> Cost {
        self.images().map(|i| self.cost_of(self.commands_of(i))).sum()
    }
}

/// Computes the intersection of two sorted slices
pub(crate) fn intersection<T: Ord + Copy>(a: &[T], b: &[T]) -> Vec<T> {
    let mut out = vec![];
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less    => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal   => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// Computes the elements of the sorted slice `a` which are not in the sorted slice `b`
pub(crate) fn difference<T: Ord + Copy>(a: &[T], b: &[T]) -> Vec<T> {
    a.iter().copied().filter(|x| b.binary_search(x).is_err()).collect()
}
