pub mod cancel;
pub mod error;
pub mod matrix_profile;
pub(crate) mod profile_state;
pub mod series;
