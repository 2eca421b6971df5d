pub mod classification;
pub mod document;
pub mod issue;
pub mod mention;
pub mod message;
pub mod phase;
pub mod project;
pub mod team;
pub mod timeline;
