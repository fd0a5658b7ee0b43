pub mod chi2;
pub mod common;
pub mod ensemble;
pub mod histogram;
pub mod learner;
pub mod ridge;
pub mod sampler;
pub mod sfa;
pub mod vocabulary;
