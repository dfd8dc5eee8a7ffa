//! monconf - Nagios-style monitoring object configuration engine
//!
//! monconf loads monitoring object definitions (hosts, services, contacts,
//! groups, dependencies, escalations, commands) and turns them into a fully
//! resolved, checked set of objects, the way a monitoring daemon does before
//! it starts scheduling.
//!
//! # Processing Overview
//!
//! - **Templates**: objects inherit from templates named in `use`, depth first
//!   in use order; `+value` appends to the inherited value instead of replacing it
//! - **Groups**: group membership can be declared on either side and groups can
//!   nest; group expressions support `|`, `&`, `!`, parentheses and `*`
//! - **Explosion**: a service attached to host groups, host tags or a generator
//!   (`duplicate_foreach`) becomes one service per host and per generated key;
//!   dependencies and escalations are split the same way
//! - **Completion**: services take settings from their host, hosts can override
//!   service properties, defaults fill the rest
//! - **Checks**: missing required properties, unknown references and loops in
//!   parents and dependencies are reported, never thrown
//!
//! # Core Modules
//!
//! ## Object model
//! - [`core`] - object kinds, entity identity, error types
//! - [`schema`] - property kinds, defaults, merging rules and typed values
//! - [`item`] - [`item::Entity`], one object or template
//! - [`collection`] - all entities of one kind with name indexes and checks
//! - [`objects`] - the schemas and kind-specific steps of every object kind
//!
//! ## Engine
//! - [`inheritance`] - template resolution of properties and custom variables
//! - [`groups`] - group expression evaluation
//! - [`generator`] - `duplicate_foreach` key generation
//! - [`explode`] - splitting one declaration into several objects
//! - [`graph`] - loop detection between objects
//! - [`pipeline`] - [`pipeline::ObjectConfig`], the full load in order
//!
//! ## Input and tooling
//! - [`parser`] - reader for `define kind { ... }` files
//! - [`config`] - `monconf.toml` settings
//! - [`cli`] - the `monconf` command line
//!
//! # Example
//!
//! ```rust,no_run
//! use monconf::parser::read_definitions;
//! use monconf::pipeline::ObjectConfig;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let mut config = ObjectConfig::new();
//! config.add_definitions(read_definitions(Path::new("objects.cfg"))?);
//! let valid = config.run();
//!
//! let diagnostics = config.diagnostics();
//! println!("valid: {valid}, {} warning(s)", diagnostics.warnings.len());
//! for service in config.services.items() {
//!     println!("{}", service.get_name());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Command Line
//!
//! ```bash
//! # Check definitions, failing on errors
//! monconf check hosts.cfg services.cfg
//!
//! # Fail on warnings too, report as JSON
//! monconf check --strict --format json objects.cfg
//!
//! # Print a resolved service
//! monconf show service "web01/HTTP" objects.cfg
//! ```

// Object model
pub mod collection;
pub mod core;
pub mod item;
pub mod objects;
pub mod schema;

// Engine
pub mod explode;
pub mod generator;
pub mod graph;
pub mod groups;
pub mod inheritance;
pub mod pipeline;

// Input and tooling
pub mod cli;
pub mod config;
pub mod parser;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
