// Session lifecycle and persistence for candidate evaluation rounds.

pub mod locks;
pub mod model;
pub mod pg_repository;
pub mod repository;
pub mod state;
