pub mod common;
pub mod join;
pub mod mass;
pub(crate) mod mdl;
pub mod mmotifs;
pub mod motifs;
pub mod mstomp;
pub(crate) mod prescrimp;
pub mod scrimp;
