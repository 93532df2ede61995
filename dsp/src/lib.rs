pub use crate::biquad::Biquad;
pub use crate::ema::{AngleEma, EulerEma};

pub mod biquad;
pub mod ema;
