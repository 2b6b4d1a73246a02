// Decision core: pure functions over rater evaluations. No I/O lives here.

pub mod aggregator;
pub mod conflict;
pub mod critical;
pub mod negotiation;
