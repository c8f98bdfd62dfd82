//! Peerbridge - Peer mentorship marketplace booking core
//!
//! This crate implements the booking and session-lifecycle orchestration
//! subsystem: slot generation over recurring availability, the group-session
//! state machine driven by a periodic trigger, payment event routing, and
//! revenue-split payouts.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
