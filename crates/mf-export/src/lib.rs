// Persistence of feature matrices for melfeat.

pub mod naming;
pub mod writer;

pub use naming::{next_sequence_number, output_path};
pub use writer::{OutputFormat, read_binary, write_matrix};
