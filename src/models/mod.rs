pub mod attendance;
pub mod audit;
pub mod hospital;
pub mod roster;
pub mod shift;
pub mod shift_assignment;
pub mod user;

pub use attendance::*;
pub use audit::*;
pub use hospital::*;
pub use roster::*;
pub use shift::*;
pub use shift_assignment::*;
pub use user::*;
