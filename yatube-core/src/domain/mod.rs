pub mod comment;
pub mod error;
pub mod follow;
pub mod form;
pub mod group;
pub mod page;
pub mod post;
pub mod user;
