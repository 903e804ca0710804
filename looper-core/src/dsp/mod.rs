//! Output DSP: resonant filters, bit-crusher and the integer helpers they share.
//!
//! Everything here runs inside the audio interrupt and is pure integer math.

pub mod intrinsics;
pub mod helpers;
pub mod svf;
pub mod crush;
pub mod chain;

pub use chain::{ChainSettings, FilterChain};
pub use crush::resolution_mask;
pub use svf::{Coefficients, StateVariableFilter};
