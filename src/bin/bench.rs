//! Benchmark for model building and solving on demo data.
//!
//! Run with: cargo run --release --bin bench [SMALL|LARGE]

use ed_rostering::config::RosterConfig;
use ed_rostering::demo_data::{self, DemoData};
use ed_rostering::optimizer::{RosterModel, RosterOptimizer};
use std::time::Instant;

fn main() {
    let demo = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<DemoData>().ok())
        .unwrap_or(DemoData::Small);
    let config = RosterConfig::default();
    let data = match demo_data::generate(demo, config.rules.night_rule) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Cannot generate demo data: {}", e);
            std::process::exit(1);
        }
    };

    println!("Benchmark: Roster Model ({})", demo.as_str());
    println!("  Doctors: {}", data.doctors.len());
    println!("  Shifts: {}", data.shifts.len());
    println!("  Leave: {}", data.leave.len());
    println!();

    // Model build only
    let build_start = Instant::now();
    match RosterModel::build(&data.doctors, &data.shifts, &data.leave, &config) {
        Ok(model) => {
            let stats = model.stats();
            println!("Model built in {:.2?}", build_start.elapsed());
            println!("  Assignment variables: {}", stats.assignment_vars);
            println!("  Conflict pairs: {}", stats.conflict_pairs);
            println!("  Constraints: {}", stats.constraints);
        }
        Err(e) => println!("Model rejected in {:.2?}: {}", build_start.elapsed(), e),
    }
    println!();

    // Full solve under the configured time limit
    let solve_start = Instant::now();
    let outcome = RosterOptimizer::new(config).solve(&data.doctors, &data.shifts, &data.leave);
    let elapsed = solve_start.elapsed();

    println!("Results:");
    println!("  Time: {:.2?}", elapsed);
    match outcome {
        Ok(roster) => {
            println!("  Assignments: {}", roster.assignments.len());
            println!("  Origin: {}", roster.origin.label());
        }
        Err(e) => println!("  No roster: {}", e),
    }
}
