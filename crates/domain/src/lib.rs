pub mod entities;
pub mod ports;
pub mod repositories;
pub mod sqlx_impls;
pub mod value_objects;

pub use courier_core::{CourierError, CourierResult};
pub use entities::*;
pub use ports::*;
pub use repositories::*;
pub use value_objects::*;
