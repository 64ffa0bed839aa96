pub mod auth;
pub mod checkout;
pub mod discounts;
pub mod orders;
pub mod products;
