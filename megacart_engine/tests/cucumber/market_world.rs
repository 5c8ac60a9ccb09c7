use std::{collections::HashMap, fmt::Debug};

use cucumber::World;
use megacart_engine::{
    db_types::{Payout, Principal},
    order_objects::CheckoutResult,
};

use crate::support::Market;

#[derive(Default, World)]
pub struct MarketWorld {
    pub system: Option<Market>,
    /// user id by email
    pub users: HashMap<String, i64>,
    /// product id by name
    pub products: HashMap<String, i64>,
    pub last_checkout: Option<CheckoutResult>,
    pub last_payout: Option<Payout>,
    pub last_error: Option<String>,
}

impl Debug for MarketWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketWorld")
            .field("db", &self.system.as_ref().map(|s| s.url.as_str()))
            .field("users", &self.users)
            .field("products", &self.products)
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl MarketWorld {
    pub fn market(&self) -> &Market {
        self.system.as_ref().expect("Market not initialised. Start the scenario with 'Given a fresh install'")
    }

    pub fn user_id(&self, email: &str) -> i64 {
        *self.users.get(email).unwrap_or_else(|| panic!("Unknown user {email}"))
    }

    pub fn buyer(&self, email: &str) -> Principal {
        Principal::buyer(self.user_id(email))
    }

    pub fn vendor(&self, email: &str) -> Principal {
        Principal::vendor(self.user_id(email))
    }

    pub fn product_id(&self, name: &str) -> i64 {
        *self.products.get(name).unwrap_or_else(|| panic!("Unknown product {name}"))
    }

    pub fn checkout(&self) -> &CheckoutResult {
        self.last_checkout.as_ref().expect("No order has been placed yet")
    }
}
