//! Domain layer: value objects, the method catalog, fee rules and the ports
//! through which the checkout reaches external collaborators.

pub mod card;
pub mod donation;
pub mod fees;
pub mod gateway;
pub mod method;
pub mod money;
pub mod ports;
pub mod session;
pub mod upi;
