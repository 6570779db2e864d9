//! The backend for the Phoenix tutoring center.
//!
//! A JSON API over PostgreSQL for the center's teachers, students, groups,
//! rooms, timetable, attendance, notes and fees. See [routes] for the full
//! API layout.

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod models;
pub mod notify;
pub mod routes;
pub mod util;
