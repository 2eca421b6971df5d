// Team directory administration and mention autocomplete.

pub mod handlers;
