//! stacktmpl-lib: render configuration files from a live stack topology
//!
//! The crate is split along the data flow:
//! - `provider`: talks to the metadata service and publishes snapshots
//! - `snapshot`: the sorted, canonical view of stacks and services
//! - `render`: render units that turn a snapshot into files and reload actions
//! - `pipeline`: the coordinator tying a watcher to a sink, with shutdown

pub mod consts;
pub mod pipeline;
pub mod provider;
pub mod render;
pub mod snapshot;
pub mod util;
