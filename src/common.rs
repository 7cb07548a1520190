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

//! This module defines the most basic data types that are used throughout all
//! the code of our library (both at the abstraction and implementation levels).
//! These are also the types your client code is likely to work with.

// ----------------------------------------------------------------------------
// --- IMAGE ------------------------------------------------------------------
// ----------------------------------------------------------------------------
/// This type denotes an image of the problem at hand. Each image is identified
/// with an integer ranging from 0 until `problem.nb_images()`. Images are
/// numbered in the lexicographic order of their names.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Image(pub usize);
impl Image {
    #[inline]
    /// This function returns the id (numeric value) of the image.
    ///
    /// # Examples:
    /// ```
    /// # use dicp::Image;
    /// assert_eq!(0, Image(0).id());
    /// assert_eq!(1, Image(1).id());
    /// ```
    pub fn id(self) -> usize {
        self.0
    }
}

// ----------------------------------------------------------------------------
// --- COMMAND ----------------------------------------------------------------
// ----------------------------------------------------------------------------
/// This type denotes a build command. Just like images, commands are numbered
/// in the lexicographic order of their names.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Command(pub usize);
impl Command {
    #[inline]
    /// This function returns the id (numeric value) of the command.
    ///
    /// # Examples:
    /// ```
    /// # use dicp::Command;
    /// assert_eq!(0, Command(0).id());
    /// assert_eq!(3, Command(3).id());
    /// ```
    pub fn id(self) -> usize {
        self.0
    }
}

/// The execution cost (expected running time) of a command.
pub type Cost = f64;

// ----------------------------------------------------------------------------
// --- Results ----------------------------------------------------------------
// ----------------------------------------------------------------------------
/// A reason explaining why a search stopped before it could prove it was done
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Reason {
    /// It stopped because the configured cutoff criterion was met
    CutoffOccurred,
    /// It stopped because the maximum number of iterations was reached
    IterationLimit,
    /// The underlying solver hit its time limit before proving optimality
    SolverTimeLimit,
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_ids {
    use crate::{Command, Image};

    #[test]
    fn test_image_id() {
        assert_eq!(0, Image(0).id());
        assert_eq!(7, Image(7).id());
    }
    #[test]
    fn images_are_ordered_by_id() {
        assert!(Image(1) < Image(2));
        assert!(Command(4) > Command(0));
    }
}
