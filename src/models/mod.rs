//! The tutoring center's entities and the queries over them.
//!
//! Every model exposes associated async functions taking a `&PgPool`
//! (or an open transaction) and returning a [CenterResult](crate::error::CenterResult).

pub mod account;
pub mod attendance;
pub mod fee;
pub mod grade;
pub mod group;
pub mod membership;
pub mod note;
pub mod report;
pub mod room;
pub mod schedule;
pub mod student;
pub mod teacher;
