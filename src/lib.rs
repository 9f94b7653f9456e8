//! Mortrack - Mortuary Operations Backend
//!
//! This crate implements the real-time relay and REST surface for the
//! Mortrack body-management application. Connected dashboard clients
//! authenticate over WebSocket and receive domain events (body, storage,
//! task, autopsy and release updates), notifications, presence and
//! heartbeats scoped by room membership.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
