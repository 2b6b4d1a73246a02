// Candidate intake, the evaluation pipeline and its HTTP handlers.

pub mod handlers;
pub mod intake;
pub mod pipeline;
