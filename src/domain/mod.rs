pub mod candle;
pub mod signal;
pub mod zone;

pub use candle::*;
pub use signal::*;
pub use zone::*;
