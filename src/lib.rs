//! # Clueboard
//!
//! This library drives a single hosted session of a Jeopardy-style quiz
//! played on one shared screen. It handles player setup, the category board,
//! the per-clue countdown, scoring, and detection of the end of the game,
//! along with the wire model of the service games are authored on.
//!
//! The session is a pure state machine: screens talk to it through
//! [`game::IncomingMessage`], it answers through a [`session::Tunnel`], and
//! time only passes when the host delivers the alarms it scheduled.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::wildcard_imports)]

pub mod api;
pub mod board;
pub mod constants;
pub mod game;
pub mod roster;
pub mod scoreboard;
pub mod session;
pub mod timer;
