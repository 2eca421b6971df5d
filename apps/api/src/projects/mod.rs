// Project context endpoints: creation, phase marker, sender attribution.

pub mod handlers;
