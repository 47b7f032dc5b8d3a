//! Colorful console output for roster runs.
//!
//! Everything here is cosmetic and compiled only with the `console` feature;
//! structured events still go through `tracing`.

use chrono::Utc;
use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::fmt::Display;
use std::time::{Duration, Instant};

use crate::domain::{Roster, RosterOrigin};

const BOX_INNER: usize = 56;

/// ASCII art banner for server startup.
pub fn print_banner() {
    let banner = r#"
  _____ ____    ____            _
 | ____|  _ \  |  _ \ ___  ___| |_ ___ _ __
 |  _| | | | | | |_) / _ \/ __| __/ _ \ '__|
 | |___| |_| | |  _ < (_) \__ \ ||  __/ |
 |_____|____/  |_| \_\___/|___/\__\___|_|
"#;
    println!("{}", banner.cyan().bold());
    println!(
        "  {} {}\n",
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black(),
        "Emergency Department Rostering".bright_cyan()
    );
}

fn log_line(message: impl Display) {
    println!(
        "{} {} {} {}",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Roster]".bright_cyan(),
        message
    );
}

fn count(n: usize) -> String {
    n.to_formatted_string(&Locale::en)
}

/// Prints the size of the roster problem about to be solved.
pub fn print_problem(doctors: usize, shifts: usize, leave: usize) {
    log_line(format_args!(
        "Problem: doctors ({}), shifts ({}), leave intervals ({})",
        count(doctors).bright_yellow(),
        count(shifts).bright_yellow(),
        count(leave).bright_yellow()
    ));
    log_line(format_args!(
        "Search space: {}",
        search_space(doctors * shifts).bright_magenta()
    ));
}

/// Times the solve and reports how it ended.
pub struct SolveTimer {
    start: Instant,
}

impl SolveTimer {
    pub fn start() -> Self {
        log_line(format_args!("{} started", "MILP solve".white().bold()));
        Self {
            start: Instant::now(),
        }
    }

    pub fn finish(self, outcome: &str) -> Duration {
        let spent = self.start.elapsed();
        log_line(format_args!(
            "{} ended: time spent ({}), outcome ({})",
            "MILP solve".white().bold(),
            format_duration(spent).yellow(),
            outcome.white()
        ));
        spent
    }
}

/// Prints the summary box for a roster that was produced.
pub fn print_roster_summary(roster: &Roster, duration: Duration) {
    let loads: Vec<usize> = roster
        .doctors
        .iter()
        .map(|d| roster.shifts_for_doctor(&d.id).len())
        .collect();
    let nights = roster
        .assignments
        .iter()
        .filter(|a| roster.shift(&a.shift_id).is_some_and(|s| s.is_night))
        .count();

    let mut summary = SummaryBox::new(match roster.origin {
        RosterOrigin::Empty => "EMPTY ROSTER (nothing to assign)",
        _ => "FEASIBLE ROSTER FOUND",
    });
    if let RosterOrigin::Optimized { objective, strategy } = &roster.origin {
        summary.row("Objective:", format!("{:.2} ({:?})", objective, strategy));
    }
    summary.row("Assignments:", count(roster.assignments.len()));
    summary.row("Night shifts:", count(nights));
    if let (Some(min), Some(max)) = (loads.iter().min(), loads.iter().max()) {
        summary.row("Shifts/doctor:", format!("{} to {}", min, max));
    }
    summary.row("Solving time:", format_duration(duration));
    summary.print(true);
}

/// Prints the summary box for a run that produced no roster.
pub fn print_run_failed(duration: Duration, reason: &str) {
    let mut summary = SummaryBox::new("NO ROSTER (hard rules cannot be met)");
    summary.row("Reason:", reason);
    summary.row("Solving time:", format_duration(duration));
    summary.print(false);
}

struct SummaryBox {
    title: String,
    rows: Vec<(String, String)>,
}

impl SummaryBox {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rows: Vec::new(),
        }
    }

    fn row(&mut self, label: &str, value: impl Into<String>) {
        let mut value = value.into();
        let room = BOX_INNER - 4 - label.chars().count().max(16);
        if value.chars().count() > room {
            value = value.chars().take(room.saturating_sub(1)).collect::<String>() + "…";
        }
        self.rows.push((label.to_string(), value));
    }

    /// Plain lines of the box; every line is `BOX_INNER + 2` characters wide.
    fn lines(&self) -> Vec<String> {
        let pad = BOX_INNER.saturating_sub(self.title.chars().count());
        let mut lines = vec![
            format!("╔{}╗", "═".repeat(BOX_INNER)),
            format!(
                "║{}{}{}║",
                " ".repeat(pad / 2),
                self.title,
                " ".repeat(pad - pad / 2)
            ),
            format!("╠{}╣", "═".repeat(BOX_INNER)),
        ];
        for (label, value) in &self.rows {
            let width = BOX_INNER - 4 - label.chars().count().max(16);
            lines.push(format!("║  {:<16}{:>width$}  ║", label, value, width = width));
        }
        lines.push(format!("╚{}╝", "═".repeat(BOX_INNER)));
        lines
    }

    fn print(&self, ok: bool) {
        println!();
        for (i, line) in self.lines().iter().enumerate() {
            if i == 1 && ok {
                println!("{}", line.bright_green().bold());
            } else if i == 1 {
                println!("{}", line.bright_red().bold());
            } else {
                println!("{}", line.bright_cyan());
            }
        }
        println!();
    }
}

fn format_duration(d: Duration) -> String {
    match d.as_millis() {
        ms @ 0..=999 => format!("{}ms", ms),
        1_000..=59_999 => format!("{:.2}s", d.as_secs_f64()),
        _ => format!("{}m {}s", d.as_secs() / 60, d.as_secs() % 60),
    }
}

fn timestamp() -> String {
    Utc::now().format("%H:%M:%S%.3f").to_string()
}

/// The 0/1 search space over `binary_vars` assignment variables, as a power of ten.
fn search_space(binary_vars: usize) -> String {
    if binary_vars == 0 {
        return "1".to_string();
    }
    let digits = (binary_vars as f64 * 2f64.log10()).floor() as u64;
    format!("2^{} ≈ 10^{}", count(binary_vars), digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }

    #[test]
    fn test_search_space() {
        assert_eq!(search_space(0), "1");
        assert_eq!(search_space(10), "2^10 ≈ 10^3");
        assert_eq!(search_space(2_880), "2^2,880 ≈ 10^866");
    }

    #[test]
    fn test_summary_box_lines_align() {
        let mut summary = SummaryBox::new("FEASIBLE ROSTER FOUND");
        summary.row("Assignments:", "252");
        summary.row("Reason:", "x".repeat(80));
        let lines = summary.lines();
        assert_eq!(lines.len(), 6);
        assert!(lines.iter().all(|l| l.chars().count() == BOX_INNER + 2));
        assert!(lines[4].ends_with("…  ║"));
    }
}
