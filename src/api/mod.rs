// Thin namespace wrapper for API-layer components
pub mod handlers {
    pub use crate::handlers::*;
}

pub mod chart {
    pub use crate::chart::*;
}

pub mod export {
    pub use crate::export::*;
}
