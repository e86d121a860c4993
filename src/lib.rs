#![allow(non_snake_case)]

mod engine;
mod error;
mod model;
mod player;
mod util;

pub use engine::*;
pub use error::*;
pub use model::builtin::*;
pub use model::catalog::*;
pub use model::config::*;
pub use model::loader::*;
pub use model::song::*;
pub use player::*;
pub use util::*;
