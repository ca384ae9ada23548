//! Input validation for invoice submissions.
//!
//! Every failure names the offending field (`client_email`,
//! `line_items[2].unit_price`, ...) so the form can show the message next to
//! the input and the JSON API can return it verbatim.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use super::models::{InvoiceInput, LineItem, NewInvoice, RawLineItem};
use super::money::{parse_amount, AmountError};

pub const MAX_CLIENT_NAME_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MAX_LINE_ITEMS: usize = 100;
pub const MAX_QUANTITY: i64 = 100_000;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid");
}

/// Trait for request objects that validate into a domain value.
pub trait Validator {
    type Output;

    fn validate(&self) -> Result<Self::Output, ValidationErrors>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidationError {
    #[schema(example = "line_items[0].quantity")]
    pub field: String,
    #[schema(example = "Quantity must be a whole number")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn empty_field(field: &str, label: &str) -> Self {
        Self::new(field, format!("{} is required", label))
    }

    pub fn too_long(field: &str, label: &str, max: usize) -> Self {
        Self::new(field, format!("{} must be at most {} characters", label, max))
    }

    pub fn invalid_email(field: &str) -> Self {
        Self::new(field, "Email address is not valid")
            .with_suggestion("Use a full address, for example billing@example.com")
    }

    pub fn invalid_quantity(field: &str) -> Self {
        Self::new(
            field,
            format!("Quantity must be a whole number between 1 and {}", MAX_QUANTITY),
        )
    }

    pub fn invalid_amount(field: &str, error: &AmountError) -> Self {
        let err = Self::new(field, format!("Unit price is not valid: {}", error));
        match error {
            AmountError::NotANumber | AmountError::TooPrecise => {
                err.with_suggestion("Enter a price such as 120 or 99.95")
            }
            _ => err,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, ". {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Collection of validation errors, in input order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn summary(&self) -> String {
        match self.errors.len() {
            0 => String::new(),
            1 => "Validation failed: 1 problem found".to_string(),
            n => format!("Validation failed: {} problems found", n),
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())?;
        for (i, error) in self.errors.iter().enumerate() {
            write!(f, "\n{}. {}", i + 1, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

pub fn validate_required(value: &str, field: &str, label: &str, errors: &mut ValidationErrors) -> bool {
    if value.trim().is_empty() {
        errors.add(ValidationError::empty_field(field, label));
        return false;
    }
    true
}

pub fn validate_max_len(value: &str, max: usize, field: &str, label: &str, errors: &mut ValidationErrors) {
    if value.trim().chars().count() > max {
        errors.add(ValidationError::too_long(field, label, max));
    }
}

pub fn validate_email(value: &str, field: &str, errors: &mut ValidationErrors) {
    if !validate_required(value, field, "Client email", errors) {
        return;
    }
    if !EMAIL_RE.is_match(value.trim()) {
        errors.add(ValidationError::invalid_email(field));
    }
}

pub fn parse_quantity(value: &str, field: &str, errors: &mut ValidationErrors) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(ValidationError::empty_field(field, "Quantity"));
        return None;
    }
    match trimmed.parse::<i64>() {
        Ok(q) if (1..=MAX_QUANTITY).contains(&q) => Some(q),
        _ => {
            errors.add(ValidationError::invalid_quantity(field));
            None
        }
    }
}

pub fn parse_unit_price(value: &str, field: &str, errors: &mut ValidationErrors) -> Option<i64> {
    match parse_amount(value) {
        Ok(cents) => Some(cents),
        Err(AmountError::Empty) => {
            errors.add(ValidationError::empty_field(field, "Unit price"));
            None
        }
        Err(e) => {
            errors.add(ValidationError::invalid_amount(field, &e));
            None
        }
    }
}

fn validate_line_item(index: usize, raw: &RawLineItem, errors: &mut ValidationErrors) -> Option<LineItem> {
    let prefix = format!("line_items[{}]", index);
    let description_field = format!("{}.description", prefix);

    let description_ok = validate_required(&raw.description, &description_field, "Description", errors);
    if description_ok {
        validate_max_len(&raw.description, MAX_DESCRIPTION_LEN, &description_field, "Description", errors);
    }
    let quantity = parse_quantity(&raw.quantity, &format!("{}.quantity", prefix), errors);
    let unit_price = parse_unit_price(&raw.unit_price, &format!("{}.unit_price", prefix), errors);

    match (description_ok, quantity, unit_price) {
        (true, Some(q), Some(p)) => Some(LineItem::new(raw.description.trim(), q, p)),
        _ => None,
    }
}

impl Validator for InvoiceInput {
    type Output = NewInvoice;

    fn validate(&self) -> Result<NewInvoice, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if validate_required(&self.client_name, "client_name", "Client name", &mut errors) {
            validate_max_len(&self.client_name, MAX_CLIENT_NAME_LEN, "client_name", "Client name", &mut errors);
        }
        validate_email(&self.client_email, "client_email", &mut errors);

        if self.line_items.is_empty() {
            errors.add(
                ValidationError::new("line_items", "At least one line item is required")
                    .with_suggestion("Add a description, quantity and unit price"),
            );
        } else if self.line_items.len() > MAX_LINE_ITEMS {
            errors.add(ValidationError::new(
                "line_items",
                format!("An invoice can have at most {} line items", MAX_LINE_ITEMS),
            ));
        }

        let items: Vec<Option<LineItem>> = self
            .line_items
            .iter()
            .take(MAX_LINE_ITEMS)
            .enumerate()
            .map(|(i, raw)| validate_line_item(i, raw, &mut errors))
            .collect();

        if !errors.is_empty() {
            return Err(errors);
        }

        let items: Vec<LineItem> = items.into_iter().flatten().collect();
        match NewInvoice::new(self.client_name.trim(), self.client_email.trim(), items) {
            Some(invoice) => Ok(invoice),
            None => {
                errors.add(ValidationError::new("line_items", "Invoice total is too large"));
                Err(errors)
            }
        }
    }
}
