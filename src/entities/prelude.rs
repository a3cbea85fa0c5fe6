pub use super::stories::Entity as Stories;
