pub mod audit_logs;
pub mod discounts;
pub mod orders;
pub mod products;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use discounts::Entity as Discounts;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use users::Entity as Users;
