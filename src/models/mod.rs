pub mod finding;
pub mod target;
pub mod verdict;

pub use finding::*;
pub use target::*;
pub use verdict::*;
