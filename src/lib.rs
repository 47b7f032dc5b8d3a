//! Emergency department doctor rostering.
//!
//! Builds monthly rosters that satisfy every hard staffing and safety rule,
//! then spreads the load fairly, using a 0/1 integer program solved with
//! `good_lp`.
//!
//! # Domain Model
//!
//! - [`Doctor`](domain::Doctor): contract hours and monthly shift bounds
//! - [`Shift`](domain::Shift): staffing slot with weekend and night flags
//! - [`LeaveInterval`](domain::LeaveInterval): dates a doctor cannot work
//! - [`Roster`](domain::Roster): assignments produced by one run
//!
//! # Hard Rules
//!
//! - **Coverage**: each shift staffed within its min/max doctors
//! - **Monthly load**: each doctor within their min/max shifts
//! - **Rest**: no overlapping shifts and a minimum rest gap between shifts
//! - **Leave**: no shift on a leave date
//! - **Weekends**: Fri/Sat/Sun nights bundled, 1–3 weekends per doctor
//! - **Nights**: at most 2 Mon–Thu nights per ISO week, at most 3 in a row
//!
//! # Analysis
//!
//! - [`feasibility`]: demand against capacity before solving
//! - [`workload`] and [`burnout`]: per-doctor statistics after solving
//! - [`audit`]: hard-rule violations of any roster

pub mod api;
pub mod audit;
pub mod burnout;
pub mod config;
pub mod conflicts;
#[cfg(feature = "console")]
pub mod console;
pub mod demo_data;
pub mod domain;
pub mod dto;
pub mod error;
pub mod feasibility;
pub mod generator;
pub mod naive;
pub mod optimizer;
pub mod solver;
pub mod store;
pub mod validation;
pub mod workload;
