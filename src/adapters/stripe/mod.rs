//! Stripe adapter: the production gateway and a configurable mock.

mod gateway;
mod mock_gateway;

pub use gateway::{StripeConfig, StripeGateway};
pub use mock_gateway::MockPaymentGateway;
