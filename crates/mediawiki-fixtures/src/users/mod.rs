// User provisioning - Lazily created wiki accounts

pub mod user_factory;

pub use user_factory::{Account, AccountCreator, AccountField, UserFactory, provision_once};
