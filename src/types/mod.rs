//! Core data types for the repricing engine: reference entities loaded from
//! CMS-derived JSON tables, the claim/line shapes the engine consumes, and the
//! priced/grouped shapes it produces.

mod claim;
mod common;
mod grouper;
mod reference;

pub use claim::*;
pub use common::*;
pub use grouper::*;
pub use reference::*;
