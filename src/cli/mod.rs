//! # CLI Module
//!
//! Command-line inspection of YAML route tables, shipped as the
//! `brrtmvc-routes` binary.
//!
//! ## Commands
//!
//! ### `list`
//!
//! Print every mapping in registration order, then the default handler:
//!
//! ```bash
//! brrtmvc-routes list --table routes.yaml
//! ```
//!
//! ### `resolve`
//!
//! Resolve one request and print the handler, the matched criteria, the
//! lookup path and the extracted URI variables:
//!
//! ```bash
//! brrtmvc-routes resolve --table routes.yaml "GET /widgets/42" -H "Accept: text/html"
//! ```
//!
//! Both commands accept `--config <FILE>` (a [`DispatchConfig`](crate::runtime_config::DispatchConfig)
//! YAML file) and `--log-level`. Route table handler ids are bound to no-op
//! handlers; nothing is invoked.

mod commands;


pub use commands::{
    load_registry, parse_request, run_cli, run_cli_with_output, Cli, Commands, InspectionProvider,
};
