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

//! Command line front end of the DICP solvers.

use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand, ValueEnum};
use log::{info, LevelFilter};

use dicp::*;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Increases the verbosity of the logs (-v: progress, -vv: details, -vvv: everything)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    action: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Solves an instance and prints the resulting schedule
    Solve {
        /// The json file describing the instance
        instance: PathBuf,
        /// The method used to solve the instance
        #[clap(short, long, value_enum, default_value = "colgen")]
        solver: Method,
        /// Where to write the solution (json)
        #[clap(short, long)]
        output: Option<PathBuf>,
        /// The maximum amount of time (in seconds) the solver may run
        #[clap(short, long)]
        time: Option<u64>,
        /// The maximum number of iterations (column generation and benders)
        #[clap(long, default_value = "1000")]
        max_iterations: usize,
        /// Seed the column generation with one clique per shared command
        #[clap(long)]
        seed_shared: bool,
        /// Seed the column generation with the schedule of a heuristic
        #[clap(long, value_enum)]
        warm_start: Option<Greedy>,
        /// Do not refine the conflicting cliques during the column generation
        #[clap(long)]
        no_refine: bool,
        /// Forbid cliques on disjoint images from sharing commands
        #[clap(long)]
        exclude_disjoint: bool,
        /// Fix the unshared commands to the last stages (stage model only)
        #[clap(long)]
        presolve: bool,
    },
    /// Generates a random instance
    Generate {
        /// The number of images
        #[clap(short, long, default_value = "10")]
        images: usize,
        /// The number of commands
        #[clap(short, long, default_value = "20")]
        commands: usize,
        /// The mean cost of a command
        #[clap(short, long, default_value = "60")]
        max_time: f64,
        /// The seed of the random generator
        #[clap(short, long, default_value = "0")]
        seed: u64,
        /// Where to write the instance (printed on stdout when omitted)
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// Prints the tree of the maximal cliques of an instance
    Cliques {
        /// The json file describing the instance
        instance: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Method {
    Colgen,
    Clique,
    Stage,
    Benders,
    Network,
    MostCommon,
    MostTime,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Greedy {
    MostCommon,
    MostTime,
}

/// The log level matching the number of `-v` flags
fn log_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Logs go to stderr. `RUST_LOG` takes precedence over the verbosity flags.
fn init_logging(verbosity: u8) {
    env_logger::Builder::new()
        .filter_level(log_level(verbosity))
        .parse_default_env()
        .init();
}

fn main() -> Result<(), Error> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.action {
        Action::Solve { instance, solver, output, time, max_iterations, seed_shared, warm_start, no_refine, exclude_disjoint, presolve } => {
            let problem = Problem::load(&instance)?;
            info!("{} images, {} commands", problem.nb_images(), problem.nb_commands());
            let time_limit = time.map(Duration::from_secs);
            let backend = MicroLp::new();

            let solver: Box<dyn Solver + '_> = match solver {
                Method::Colgen => {
                    let config = ColumnGenerationConfigBuilder::default()
                        .max_iterations(max_iterations)
                        .time_limit(time_limit)
                        .seed_shared_commands(seed_shared)
                        .refine_intersections(!no_refine)
                        .exclude_disjoint_overlaps(exclude_disjoint)
                        .build()?;
                    let colgen = ColumnGeneration::new(&backend, config);
                    match warm_start {
                        Some(Greedy::MostCommon) => Box::new(colgen.with_warm_start(&MostCommon)),
                        Some(Greedy::MostTime)   => Box::new(colgen.with_warm_start(&MostTime)),
                        None                     => Box::new(colgen),
                    }
                },
                Method::Clique     => Box::new(CliqueModel::new(&backend).with_time_limit(time_limit)),
                Method::Stage      => Box::new(StageModel::new(&backend).with_presolve(presolve).with_time_limit(time_limit)),
                Method::Benders    => Box::new(BendersModel::new(&backend).with_max_iterations(max_iterations).with_time_limit(time_limit)),
                Method::Network    => Box::new(NetworkModel::new(&backend).with_time_limit(time_limit)),
                Method::MostCommon => Box::new(MostCommon),
                Method::MostTime   => Box::new(MostTime),
            };

            let solution = solver.solve(&problem)?;
            let stats = solution.stats(&problem);
            println!("solver        : {}", solver.slug());
            println!("is exact      : {}", solution.is_exact);
            println!("duration      : {:.3} seconds", solution.elapsed.as_secs_f64());
            println!("unique images : {}", stats.unique_images);
            println!("compute time  : {}", stats.compute_time);
            println!("trivial cost  : {}", problem.trivial_cost());
            for (image, order) in solution.schedule.to_names(&problem) {
                println!("{image:>8} : {}", order.join(" "));
            }
            if let Some(path) = output {
                solution.save(path, &problem)?;
            }
        },
        Action::Generate { images, commands, max_time, seed, output } => {
            let problem = Problem::generate(images, commands, max_time, seed)?;
            match output {
                Some(path) => problem.save(path)?,
                None => println!("{}", problem.to_json()?),
            }
        },
        Action::Cliques { instance } => {
            let problem = Problem::load(&instance)?;
            let tree = CliqueEnumerator::new(&problem).enumerate();
            info!("{} cliques over {} levels", tree.len(), tree.depth());
            println!("{}", serde_json::to_string_pretty(&tree.to_json(&problem))?);
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use log::LevelFilter;

    use super::{log_level, Action, Args, Method};

    #[test]
    fn the_command_line_is_well_formed() {
        Args::command().debug_assert();
    }
    #[test]
    fn each_v_flag_raises_the_log_level() {
        assert_eq!(LevelFilter::Warn, log_level(0));
        assert_eq!(LevelFilter::Info, log_level(1));
        assert_eq!(LevelFilter::Debug, log_level(2));
        assert_eq!(LevelFilter::Trace, log_level(5));

        let args = Args::parse_from(["dicp", "-vv", "cliques", "instance.json"]);
        assert_eq!(LevelFilter::Debug, log_level(args.verbose));
        assert!(matches!(args.action, Action::Cliques { .. }));

        let args = Args::parse_from(["dicp", "solve", "instance.json", "-s", "benders"]);
        assert!(matches!(args.action, Action::Solve { solver: Method::Benders, .. }));
    }
}
