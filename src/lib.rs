#![doc = "segment-voucherify-sync: bulk migration of Segment.io Personas profiles into Voucherify."]

//! This crate contains the full synchronisation pipeline: paginated profile
//! listing from Segment, per-profile enrichment (traits and external ids),
//! mapping into Voucherify's customer schema, and chunked bulk upserts.
//! The controller in [`synchronise`] drives the loop and owns the resume
//! cursor; everything below it is stateless.
//!
//! # Usage
//! The binary wires [`segment::SegmentClient`] and
//! [`voucherify::VoucherifyClient`] into [`synchronise::synchronise`]; tests
//! substitute the mock implementations exported from [`contract`].

pub mod cli;
pub mod config;
pub mod contract;
pub mod enrich;
pub mod error;
pub mod limiter;
pub mod load_config;
pub mod mapper;
pub mod segment;
pub mod synchronise;
pub mod voucherify;
