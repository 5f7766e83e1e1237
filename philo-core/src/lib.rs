pub mod config;
pub mod error;
pub mod io;
pub mod phylo;

pub use config::Limits;
pub use error::{PhyloError, PhyloResult};
