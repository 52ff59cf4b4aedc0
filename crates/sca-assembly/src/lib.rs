//! Assembly resolution for Service Component Architecture descriptors
//!
//! Takes a parsed [`Contribution`](model::Contribution) and computes the
//! resolved assembly: hierarchical component URIs, reference endpoints
//! (explicit targets, wires, autowire and binding URIs), flattened promotion
//! chains, effective intents and policy sets, and final binding names and URIs.
//!
//! ```no_run
//! use sca_assembly::{CompositeBuilder, Monitor};
//! # fn run(contribution: &sca_assembly::model::Contribution) -> sca_assembly::Result<()> {
//! let mut monitor = Monitor::new();
//! let assembly = CompositeBuilder::new().build(contribution, &mut monitor)?;
//! for problem in monitor.problems() {
//!     eprintln!("{}", problem);
//! }
//! println!("{:?}", assembly.snapshot());
//! # Ok(())
//! # }
//! ```

pub mod assembly;
pub mod binding;
pub mod builder;
pub mod endpoint;
pub mod error;
pub mod interface;
pub mod model;
pub mod monitor;
pub mod policy;

pub use assembly::{Assembly, ResolvedComposite};
pub use builder::{BuildOptions, CompositeBuilder};
pub use endpoint::{DefaultEndpointBuilder, Endpoint, EndpointBuilder, EndpointTarget};
pub use error::{BindingError, BuildError, Result};
pub use interface::{DefaultContractMapper, InterfaceContractMapper};
pub use monitor::{Monitor, Problem, Severity};
