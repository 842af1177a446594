//! Floorplan compilation on an exact planar subdivision.
//!
//! A [`site::SiteTree`] of areas, walls and connections is inserted into an
//! [`arrangement::Arrangement`], connections become doorstep edges, faces are
//! classified into floors and fillers, and wall loops are stitched and
//! nested into contours.

pub mod arrangement;
pub mod compiler;
pub mod error;
pub mod math;
pub mod operations;
pub mod output;
pub mod site;
pub mod tessellation;

pub use compiler::{CompileConfig, Compiler, Passes};
pub use error::{FloorplanError, Result};
pub use output::{Compilation, Floorplan};
