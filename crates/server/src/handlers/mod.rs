pub mod deck;
pub mod health;
pub mod template;

pub use deck::{generate_deck, patch_deck};
pub use health::{health_check, root};
pub use template::analyze_template;
