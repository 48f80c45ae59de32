mod portalrc;

pub use portalrc::*;
