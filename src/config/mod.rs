//! Configuration module

mod site;

pub use site::BuildConfig;
pub use site::CommentsConfig;
pub use site::PreviewConfig;
pub use site::RepositoryConfig;
pub use site::RepositoryKind;
pub use site::SiteConfig;
pub use site::{ACCESS_TOKEN_ENV, ENDPOINT_ENV};
