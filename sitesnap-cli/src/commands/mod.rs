pub mod export;
pub mod list;
pub mod serve;
pub mod token;

pub use export::cmd_export;
pub use list::{cmd_list, ListOptions};
pub use serve::cmd_serve;
pub use token::cmd_token;
