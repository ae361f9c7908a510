mod candle;
mod filter_result;
mod sort_direction;
mod timeframe;

pub use candle::{Candle, WindowRange};
pub use filter_result::{Annotation, FilterResult};
pub use sort_direction::SortDirection;
pub use timeframe::Timeframe;
