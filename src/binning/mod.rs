pub mod equi_depth;
pub mod equi_width;
pub mod information_gain;
