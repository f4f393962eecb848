use serde_json::{Map, Value, json};

use crate::error::{DomainError, DomainResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefill {
    pub email: Option<String>,
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub enabled: bool,
    pub max_count: u8,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_count: 4,
        }
    }
}

/// Options handed to the hosted checkout. Amounts are in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutOptions {
    amount_minor: u64,
    currency: String,
    name: String,
    description: String,
    order_id: Option<String>,
    prefill: Prefill,
    theme_color: String,
    retry: RetryPolicy,
}

impl CheckoutOptions {
    pub fn new(
        amount_minor: u64,
        currency: &str,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> DomainResult<Self> {
        if amount_minor == 0 {
            return Err(DomainError::InvalidAmount(
                "amount must be greater than zero".to_string(),
            ));
        }

        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(DomainError::InvalidCurrency(currency.to_string()));
        }

        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::InvalidCheckoutOptions(
                "merchant name cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            amount_minor,
            currency: currency.to_string(),
            name,
            description: description.into(),
            order_id: None,
            prefill: Prefill {
                email: None,
                contact: None,
            },
            theme_color: "#FF5722".to_string(),
            retry: RetryPolicy::default(),
        })
    }

    #[must_use]
    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    #[must_use]
    pub fn with_prefill(mut self, email: Option<String>, contact: Option<String>) -> Self {
        self.prefill = Prefill {
            email: email.filter(|e| !e.is_empty()),
            contact: contact.filter(|c| !c.is_empty()),
        };
        self
    }

    #[must_use]
    pub fn with_theme_color(mut self, color: impl Into<String>) -> Self {
        self.theme_color = color.into();
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn amount_minor(&self) -> u64 {
        self.amount_minor
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Flat JSON blob in the shape the checkout SDK expects (dotted keys
    /// for nested settings, a nested `prefill` object).
    pub fn to_json(&self) -> Value {
        let mut options = Map::new();
        options.insert("name".to_string(), json!(self.name));
        options.insert("description".to_string(), json!(self.description));
        options.insert("currency".to_string(), json!(self.currency));
        options.insert("amount".to_string(), json!(self.amount_minor));
        options.insert("theme.color".to_string(), json!(self.theme_color));
        options.insert("retry.enabled".to_string(), json!(self.retry.enabled));
        options.insert("retry.max_count".to_string(), json!(self.retry.max_count));

        if let Some(order_id) = &self.order_id {
            options.insert("order_id".to_string(), json!(order_id));
        }

        let mut prefill = Map::new();
        if let Some(email) = &self.prefill.email {
            prefill.insert("email".to_string(), json!(email));
        }
        if let Some(contact) = &self.prefill.contact {
            prefill.insert("contact".to_string(), json!(contact));
        }
        options.insert("prefill".to_string(), Value::Object(prefill));

        Value::Object(options)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Succeeded {
        payment_id: String,
        order_id: Option<String>,
        signature: Option<String>,
    },
    Failed {
        code: i32,
        description: String,
    },
}

impl PaymentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PaymentOutcome::Succeeded { .. })
    }

    /// Successful payments carrying a signature still need server-side
    /// verification before the order can be confirmed.
    pub fn needs_verification(&self) -> bool {
        matches!(
            self,
            PaymentOutcome::Succeeded {
                signature: Some(_),
                ..
            }
        )
    }
}
