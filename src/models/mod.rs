pub mod link;

pub use link::{CreateLinkRequest, CreatedLink, Link, LinkList};
