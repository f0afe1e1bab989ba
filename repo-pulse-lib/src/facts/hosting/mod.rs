mod client;
mod provider;

pub use client::{Contributor, Repository, Stargazer, TrafficEntry, TrafficKind, TrafficSummary};
pub use provider::{HostingOptions, Provider};
