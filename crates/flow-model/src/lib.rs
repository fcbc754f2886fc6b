//! Flowdraw Flow Model
//!
//! Defines the data contracts for flow definitions:
//! - **Node:** A typed record with an owning workspace (`z`) and output wires
//! - **Workspace:** A `tab` node; the unit of rendering
//! - **Flow:** The parsed, immutable collection of nodes for one input file
//!
//! Parsing accepts the bare node array written by the editor's export
//! dialog as well as the `{"flows": [...], "rev": "..."}` storage shape.

pub mod flow;
pub mod node;

pub use flow::*;
pub use node::*;
