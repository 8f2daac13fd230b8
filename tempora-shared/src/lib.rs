pub mod normalize;
pub mod pii;
