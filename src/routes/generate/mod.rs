mod handler;
mod model;
mod prompt;

pub use handler::generate_list;
pub use model::{GeneratedList, GenerationMethod, parse_model_output};
pub use prompt::system_instruction;
