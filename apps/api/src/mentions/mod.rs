// @mention resolution and the mention management API.

pub mod handlers;
pub mod resolver;
