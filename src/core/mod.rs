// Domain-layer modules and shared errors/models
pub mod analysis {
    pub use crate::analysis::*;
}

pub mod cleaning {
    pub use crate::cleaning::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod summary_store {
    pub use crate::summary_store::*;
}

pub mod errors {
    pub use crate::errors::*;
}
