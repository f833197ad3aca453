pub mod audit_entry;
pub mod school_profile;
pub mod system_setting;
pub mod user;
