pub mod error;
pub mod mino;
pub mod traits;
pub mod util;

pub use error::{AiError, Result};
pub use mino::Mino;
pub use traits::{ChatModel, Message, MessageRole};
pub use util::{decode_json, extract_json, strip_code_blocks, truncate_to_char_boundary};
