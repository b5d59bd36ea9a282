//! Helper functions for templates
//!
//! URL generation and localized date formatting shared by the generator and
//! the server.

mod date;
mod url;

pub use self::date::*;
pub use self::url::*;
