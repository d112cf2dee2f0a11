mod clipper;
mod compare;
mod config;
mod error;
mod fixed;
mod golden;
pub mod math;
mod stimulus;
mod verify;
pub mod zbuffer;

pub use clipper::*;
pub use compare::*;
pub use config::*;
pub use error::*;
pub use fixed::*;
pub use golden::{ClipCase, ClipExpectation, DepthCase, GoldenGenerator, GoldenSet, VectorFormat};
pub use stimulus::*;
pub use verify::*;
