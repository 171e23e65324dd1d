//! Repository layer: entity-scoped database operations.
//!
//! One sub-module per table; everything is re-exported here.

mod assignment;
mod doctor_note;
mod recovery_log;
mod user;

pub use assignment::*;
pub use doctor_note::*;
pub use recovery_log::*;
pub use user::{
    delete_user, find_credentials, get_patient_profile, get_user, get_user_with_role,
    insert_user, list_users, update_password,
};
