pub mod db;

mod name;
pub use name::Name;

pub mod naming;

mod verify;
