mod budget;
mod category;
mod money;
mod progress;
mod transaction;

pub use budget::*;
pub use category::*;
pub use money::*;
pub use progress::*;
pub use transaction::*;
