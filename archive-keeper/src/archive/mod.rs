/*!
Archiving core: registry, disable guard, delete interception and the
per-record pipeline, plus the configuration that wires them together
*/

pub(crate) mod cascade;
pub mod config;
pub mod context;
pub mod destination;
pub mod entity;
pub mod error;
pub mod guard;
pub mod interceptor;
pub mod keeper;
pub mod migration;
pub(crate) mod mover;
pub mod pipeline;
pub mod reader;
pub mod record;
pub mod registry;
