//! The checkout state machine.
//!
//! - [`CheckoutWizard`]: the pure four-step flow and the order draft
//! - [`CheckoutSession`]: the wizard plus wallets, payment submission,
//!   confirmation tracking and notification
//! - [`CheckoutView`]: what the presentation layer renders

pub mod session;
pub mod view;
pub mod wizard;

pub use session::{CheckoutSession, PaymentRails, Wallets};
pub use view::{CheckoutView, PaymentPrompt};
pub use wizard::{CheckoutWizard, OrderDraft, Step, Transition, WizardError};
