//! Decision tree modelling.
//!
//! A forest of Decision, Chance and End nodes held in an arena-backed
//! [`domain::NodeStore`], with expected values computed for Chance nodes by
//! [`domain::expected_value`]. The [`application`] layer adds a small command
//! language and an editing session; [`cli`] exposes both as `dectree`.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod tree_traits;
pub mod util;
