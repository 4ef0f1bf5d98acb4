mod checkpoint;
mod poll;
pub use checkpoint::*;
pub use poll::*;
