// Phase & progress intelligence.
// Buckets classified evidence and milestone events into the ordered
// construction-phase axis, derives per-phase status and an overall progress
// estimate. The computation is pure and lives in aggregate; handlers only
// fetch inputs and serve the view.

pub mod aggregate;
pub mod handlers;
