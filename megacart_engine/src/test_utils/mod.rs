//! Helpers for integration tests: throwaway databases, a deterministic payment gateway, a notifier that records what
//! it was asked to send, and seed data.
mod mock_gateway;
mod prepare_env;
mod recording_notifier;
mod seed;

pub use mock_gateway::{MockGateway, MOCK_GATEWAY_SECRET};
pub use prepare_env::{create_database, prepare_test_env, random_db_path, run_migrations};
pub use recording_notifier::RecordingNotifier;
pub use seed::{seed_buyer, seed_vendor, test_address, SeededVendor};
