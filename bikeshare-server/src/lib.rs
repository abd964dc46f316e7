//! Live bikeshare station status server.
//!
//! Polls a GBFS feed, joins station metadata with live counts, and serves
//! the latest snapshot with a system-wide summary. When the upstream fails,
//! the last good snapshot keeps being served, marked stale.

pub mod cache;
pub mod config;
pub mod domain;
pub mod gbfs;
pub mod reconcile;
pub mod scheduler;
pub mod web;
