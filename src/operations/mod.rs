mod build;
mod classify;
mod connection;
pub mod walls;

pub use build::{BuildArrangement, BuildReport, InsertPolygon};
pub use classify::{ClassifyFaces, FaceClassification};
pub use connection::{ResolveConnection, ResolvedDoorstep};
