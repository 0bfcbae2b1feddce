pub mod metadata;
pub mod participant;
pub mod payment;
pub mod store;

pub use metadata::{Capacity, CodecError};
pub use participant::Participant;
pub use payment::{
    CheckoutSession, LineItem, LineItemPrice, NewCheckoutSession, PaymentStatus, Price,
    Product,
};
pub use store::{CatalogStore, StoreError, TransactionStore};
