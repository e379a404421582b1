pub mod apply;
pub mod destroy;
pub mod fleet;
pub mod plan;
pub mod state;
pub mod validate;
