// Storage operation traits and implementations
pub mod delete;
pub mod download;
pub mod list;
pub mod stat;
pub mod upload;

pub use delete::Deleter;
pub use download::Downloader;
pub use list::Lister;
pub use stat::Stater;
pub use upload::Uploader;
