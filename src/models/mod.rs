pub mod author;
pub mod comment;
pub mod group;
pub mod post;
pub mod profile;
pub mod vote;
