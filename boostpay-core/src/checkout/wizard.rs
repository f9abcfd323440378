//! The four-step checkout flow.
//!
//! ```text
//! ServiceSelection -> DetailsCollection -> Payment -> Success
//! ```
//!
//! Every method is a no-op outside the step it belongs to. Invalid
//! transitions are ignored rather than reported.

use crate::catalog::{Catalog, DurationOption, Service};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    ServiceSelection,
    DetailsCollection,
    Payment,
    Success,
}

impl Step {
    /// Progress bar position, in percent.
    pub fn progress(self) -> u8 {
        match self {
            Step::ServiceSelection => 25,
            Step::DetailsCollection => 50,
            Step::Payment => 75,
            Step::Success => 100,
        }
    }
}

/// Result of a wizard action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Moved(Step),
    /// Back was pressed on the first step of a wizard opened by a caller;
    /// control goes back to the caller.
    Exited,
    Unchanged,
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("unknown service: {0}")]
    UnknownService(String),
    #[error("price must be positive, got {0}")]
    InvalidPrice(Decimal),
}

/// The purchase being put together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderDraft {
    pub service: Option<Service>,
    pub duration: Option<DurationOption>,
    /// Locked when the details step is completed.
    pub price: Option<Decimal>,
    pub email: String,
    pub telegram: String,
    pub terms_accepted: bool,
}

#[derive(Debug, Clone)]
pub struct CheckoutWizard {
    catalog: Catalog,
    step: Step,
    draft: OrderDraft,
    price_override: Option<Decimal>,
    exit_on_back: bool,
}

impl CheckoutWizard {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            step: Step::ServiceSelection,
            draft: OrderDraft::default(),
            price_override: None,
            exit_on_back: false,
        }
    }

    /// Open on the details step with `service_id` already chosen.
    ///
    /// `price`, when given, wins over the catalog price and must be positive.
    /// Going back from the details step then exits the wizard instead of
    /// showing the catalog.
    pub fn open_with_service(
        catalog: Catalog,
        service_id: &str,
        price: Option<Decimal>,
    ) -> Result<Self, WizardError> {
        let service = catalog
            .get(service_id)
            .cloned()
            .ok_or_else(|| WizardError::UnknownService(service_id.to_string()))?;
        if let Some(price) = price.filter(|p| *p <= Decimal::ZERO) {
            return Err(WizardError::InvalidPrice(price));
        }
        let mut wizard = Self::new(catalog);
        wizard.draft.service = Some(service);
        wizard.price_override = price;
        wizard.exit_on_back = true;
        wizard.step = Step::DetailsCollection;
        Ok(wizard)
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn draft(&self) -> &OrderDraft {
        &self.draft
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Price implied by the current selection.
    pub fn resolved_price(&self) -> Option<Decimal> {
        self.price_override
            .or_else(|| self.draft.duration.as_ref().map(|d| d.price))
            .or_else(|| self.draft.service.as_ref().map(|s| s.price))
    }

    /// The price being paid. Only set from the payment step on.
    pub fn payment_price(&self) -> Option<Decimal> {
        match self.step {
            Step::Payment | Step::Success => self.draft.price,
            _ => None,
        }
    }

    /// Pick a service. Services with durations stay on this step until a
    /// duration is picked.
    pub fn select_service(&mut self, service_id: &str) -> Transition {
        if self.step != Step::ServiceSelection {
            return Transition::Unchanged;
        }
        let Some(service) = self.catalog.get(service_id).cloned() else {
            debug!(service_id, "Ignoring unknown service");
            return Transition::Unchanged;
        };
        let has_durations = service.has_durations();
        self.draft.service = Some(service);
        self.draft.duration = None;
        if has_durations {
            Transition::Unchanged
        } else {
            self.move_to(Step::DetailsCollection)
        }
    }

    /// Pick a duration of the selected service.
    pub fn select_duration(&mut self, label: &str) -> Transition {
        if self.step != Step::ServiceSelection {
            return Transition::Unchanged;
        }
        let Some(duration) = self
            .draft
            .service
            .as_ref()
            .and_then(|s| s.duration(label))
            .cloned()
        else {
            return Transition::Unchanged;
        };
        self.draft.duration = Some(duration);
        self.move_to(Step::DetailsCollection)
    }

    pub fn set_email(&mut self, email: impl Into<String>) -> bool {
        self.on_details(|draft| draft.email = email.into())
    }

    pub fn set_telegram(&mut self, telegram: impl Into<String>) -> bool {
        self.on_details(|draft| draft.telegram = telegram.into())
    }

    pub fn set_terms_accepted(&mut self, accepted: bool) -> bool {
        self.on_details(|draft| draft.terms_accepted = accepted)
    }

    fn on_details(&mut self, edit: impl FnOnce(&mut OrderDraft)) -> bool {
        if self.step != Step::DetailsCollection {
            return false;
        }
        edit(&mut self.draft);
        true
    }

    /// Whether the details step may be left forward.
    pub fn can_advance(&self) -> bool {
        self.step == Step::DetailsCollection
            && is_plausible_email(&self.draft.email)
            && self.draft.terms_accepted
            && self.resolved_price().is_some_and(|p| p > Decimal::ZERO)
    }

    /// Leave the details step for payment, locking the price.
    pub fn advance(&mut self) -> Transition {
        if !self.can_advance() {
            return Transition::Unchanged;
        }
        self.draft.price = self.resolved_price();
        self.move_to(Step::Payment)
    }

    pub fn back(&mut self) -> Transition {
        match self.step {
            Step::DetailsCollection if self.exit_on_back => Transition::Exited,
            Step::DetailsCollection => {
                self.draft.duration = None;
                self.move_to(Step::ServiceSelection)
            }
            Step::Payment => {
                self.draft.price = None;
                self.move_to(Step::DetailsCollection)
            }
            Step::ServiceSelection | Step::Success => Transition::Unchanged,
        }
    }

    /// Payment settled.
    pub fn complete_payment(&mut self) -> Transition {
        if self.step != Step::Payment {
            return Transition::Unchanged;
        }
        self.move_to(Step::Success)
    }

    fn move_to(&mut self, step: Step) -> Transition {
        debug!(from = ?self.step, to = ?step, "Checkout step changed");
        self.step = step;
        Transition::Moved(step)
    }
}

/// One `@`, a non-empty local part and a dotted domain, no whitespace.
pub fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
