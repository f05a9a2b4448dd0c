pub mod error;
pub mod grid;
pub mod quadrant;

mod cell;

pub use error::{GridError, GridResult};
pub use grid::{Config, Grid};
pub use quadrant::{Direction, Quadrant};
