pub mod annotate;
pub mod evaluate;
pub mod extract;
pub mod slices;

pub use annotate::*;
pub use evaluate::*;
pub use extract::*;
pub use slices::*;
