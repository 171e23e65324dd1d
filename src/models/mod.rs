pub mod assignment;
pub mod doctor_note;
pub mod enums;
pub mod recovery_log;
pub mod user;

pub use assignment::*;
pub use doctor_note::*;
pub use enums::*;
pub use recovery_log::*;
pub use user::*;
