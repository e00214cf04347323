mod setup;
mod data_rw;
mod tuple_source;

pub use data_rw::*;
pub use setup::*;
pub use tuple_source::*;
