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

//! End to end tests of the DICP solvers on small instances whose optimum is
//! known by brute force.

use std::path::PathBuf;

use dicp::*;

fn locate(id: &str) -> PathBuf {
    PathBuf::new()
        .join(env!("CARGO_MANIFEST_DIR"))
        .join("tests/resources/dicp/")
        .join(id)
}

fn instance(id: &str) -> Problem {
    Problem::load(locate(id)).expect("could not load instance")
}

/// The best compute time over all the possible schedules
fn brute_force(problem: &Problem) -> Cost {
    fn permutations(items: &[Command]) -> Vec<Vec<Command>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut out = vec![];
        for k in 0..items.len() {
            let mut rest = items.to_vec();
            let first = rest.remove(k);
            for mut tail in permutations(&rest) {
                tail.insert(0, first);
                out.push(tail);
            }
        }
        out
    }
    fn explore(problem: &Problem, orders: &[Vec<Vec<Command>>], depth: usize, schedule: &mut Vec<(Image, Vec<Command>)>, best: &mut Cost) {
        if depth == orders.len() {
            let s = schedule.iter().cloned().collect::<Schedule>();
            let cost = s.stats(problem).compute_time;
            if cost < *best {
                *best = cost;
            }
            return;
        }
        for order in orders[depth].iter() {
            schedule.push((Image(depth), order.clone()));
            explore(problem, orders, depth + 1, schedule, best);
            schedule.pop();
        }
    }
    let orders = problem.images().map(|i| permutations(problem.commands_of(i))).collect::<Vec<_>>();
    let mut best = Cost::INFINITY;
    explore(problem, &orders, 0, &mut vec![], &mut best);
    best
}

#[test]
fn brute_force_optimum_of_the_example() {
    let pb = instance("example.json");
    assert_eq!(39.0, brute_force(&pb));
    assert_eq!(78.0, pb.trivial_cost());
}

#[test]
fn brute_force_optimum_of_the_nested_instance() {
    let pb = instance("nested.json");
    // every command runs exactly once
    assert_eq!(33.0, brute_force(&pb));
}

#[test]
fn clique_model_is_optimal() {
    for id in ["example.json", "nested.json"] {
        let pb = instance(id);
        let backend = MicroLp::new();
        let solution = CliqueModel::new(&backend).solve(&pb).unwrap();
        assert!(solution.schedule.validate(&pb).is_ok());
        assert_eq!(brute_force(&pb), solution.stats(&pb).compute_time, "{id}");
    }
}

#[test]
fn column_generation_with_seeded_commands_is_optimal() {
    for id in ["example.json", "nested.json"] {
        let pb = instance(id);
        let config = ColumnGenerationConfigBuilder::default().seed_shared_commands(true).build().unwrap();
        let backend = MicroLp::new();
        let report = ColumnGeneration::new(&backend, config).run(&pb).unwrap();
        assert!(report.converged);
        assert!(report.schedule.validate(&pb).is_ok());
        let optimum = brute_force(&pb);
        assert!((report.objective - optimum).abs() < 1e-6, "{id}");
        assert_eq!(optimum, report.schedule.stats(&pb).compute_time, "{id}");
    }
}

#[test]
fn column_generation_reaches_the_optimum_from_singletons() {
    let pb = instance("example.json");
    let backend = MicroLp::new();
    let config = ColumnGenerationConfig::default();
    let report = ColumnGeneration::new(&backend, config).run(&pb).unwrap();
    assert!(report.converged);
    assert!(report.stopped.is_none());
    assert!(report.schedule.validate(&pb).is_ok());

    let cost = report.schedule.stats(&pb).compute_time;
    assert_eq!(brute_force(&pb), cost);
    assert!((report.objective - cost).abs() < 1e-6);
    for pair in report.objectives.windows(2) {
        assert!(pair[1] <= pair[0] + 1e-6);
    }
}

#[test]
fn column_generation_warm_started_by_a_heuristic() {
    let pb = instance("example.json");
    let backend = MicroLp::new();
    let solver = ColumnGeneration::new(&backend, ColumnGenerationConfig::default()).with_warm_start(&MostTime);
    let solution = solver.solve(&pb).unwrap();
    // the heuristic already finds the optimum on this instance
    assert_eq!(39.0, solution.stats(&pb).compute_time);
    assert!(solution.is_exact);
}

#[test]
fn without_sharing_column_generation_converges_at_once() {
    let pb = instance("disjoint.json");
    let backend = MicroLp::new();
    let config = ColumnGenerationConfig::default();
    let report = ColumnGeneration::new(&backend, config).run(&pb).unwrap();
    assert_eq!(1, report.iterations);
    assert!(report.converged);
    assert_eq!(pb.trivial_cost(), report.schedule.stats(&pb).compute_time);
    assert!((report.objective - pb.trivial_cost()).abs() < 1e-6);
    assert!(CliqueEnumerator::new(&pb).enumerate().is_empty());
}

#[test]
fn stage_model_is_optimal_on_the_example() {
    let pb = instance("example.json");
    let backend = MicroLp::new();
    for presolve in [false, true] {
        let solution = StageModel::new(&backend).with_presolve(presolve).solve(&pb).unwrap();
        assert!(solution.schedule.validate(&pb).is_ok());
        assert_eq!(39.0, solution.stats(&pb).compute_time);
    }
}

#[test]
fn benders_matches_the_brute_force() {
    let backend = MicroLp::new();
    for id in ["example.json", "nested.json"] {
        let pb = instance(id);
        let solution = BendersModel::new(&backend).solve(&pb).unwrap();
        assert!(solution.schedule.validate(&pb).is_ok());
        assert!(solution.is_exact, "{id}");
        assert_eq!(brute_force(&pb), solution.stats(&pb).compute_time, "{id}");
    }
}

#[test]
fn network_model_matches_the_brute_force() {
    let backend = MicroLp::new();
    for id in ["example.json", "nested.json", "disjoint.json"] {
        let pb = instance(id);
        let solution = NetworkModel::new(&backend).solve(&pb).unwrap();
        assert!(solution.is_exact, "{id}");
        assert_eq!(brute_force(&pb), solution.stats(&pb).compute_time, "{id}");
        assert_eq!(Some(brute_force(&pb)), solution.objective);
    }
}

#[test]
fn heuristics_produce_valid_schedules() {
    let generated = Problem::generate(15, 25, 30.0, 11).unwrap();
    for pb in [instance("example.json"), instance("nested.json"), generated] {
        let heuristics: [&dyn Solver; 2] = [&MostCommon, &MostTime];
        for h in heuristics {
            let solution = h.solve(&pb).unwrap();
            assert!(solution.schedule.validate(&pb).is_ok(), "{}", h.slug());
            assert!(solution.stats(&pb).compute_time <= pb.trivial_cost());
        }
    }
}

#[test]
fn solutions_are_saved_with_their_stats() {
    let pb = instance("example.json");
    let backend = MicroLp::new();
    let solution = CliqueModel::new(&backend).solve(&pb).unwrap();

    let path = std::env::temp_dir().join(format!("dicp-solution-{}.json", std::process::id()));
    solution.save(&path, &pb).unwrap();
    let back = Solution::load(&path, &pb).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(solution.schedule, back.schedule);
    assert_eq!(Some(39.0), back.objective);
}

#[test]
fn problems_survive_a_trip_to_the_disk() {
    let pb = instance("nested.json");
    let path = std::env::temp_dir().join(format!("dicp-problem-{}.json", std::process::id()));
    pb.save(&path).unwrap();
    let back = Problem::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(pb.to_json().unwrap(), back.to_json().unwrap());
}

#[test]
fn malformed_instances_are_rejected() {
    assert!(matches!(Problem::load(locate("malformed.json")), Err(Error::MalformedInstance(_))));
    assert!(matches!(Problem::load(locate("missing.json")), Err(Error::Io(_))));
    assert!(matches!(Problem::from_json("{\"commands\": 3}"), Err(Error::Json(_))));
}
