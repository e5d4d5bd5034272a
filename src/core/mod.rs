// Domain-layer modules and shared errors/models
pub mod fiscal_code {
    pub use crate::fiscal_code::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod resolver {
    pub use crate::resolver::*;
}

pub mod reformat {
    pub use crate::reformat::*;
}

pub mod services {
    pub use crate::services::*;
}

pub mod errors {
    pub use crate::errors::*;
}
