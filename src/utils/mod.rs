pub mod paths;
pub mod registry;
pub mod secret;
