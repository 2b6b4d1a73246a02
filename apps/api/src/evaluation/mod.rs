// Rater evaluations: the data contract between interviewers and the decision core.

pub mod parser;
pub mod record;
