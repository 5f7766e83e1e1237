pub mod csv;

pub use self::csv::{read_distance_table, write_distance_matrix, EdgeWriter};
