// ✏️ Asset / Debt forms - raw text input in, validated entities out

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

use crate::entities::{Asset, Debt};

/// Validation messages keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<&'static str, String>);

impl FormErrors {
    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.values().map(String::as_str).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for FormErrors {}

fn parse_positive(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

// ============================================================================
// ASSET FORM
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetForm {
    pub name: String,
    pub value: String,
    pub is_home_equity: bool,
}

impl AssetForm {
    /// Prefill from an existing asset for editing
    pub fn from_asset(asset: &Asset) -> Self {
        AssetForm {
            name: asset.name.clone(),
            value: asset.value.to_string(),
            is_home_equity: asset.is_home_equity,
        }
    }

    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        if self.name.trim().is_empty() {
            errors.insert("name", "Asset name is required");
        }
        if parse_positive(&self.value).is_none() {
            errors.insert("value", "Value is required");
        }
        errors.into_result()
    }

    /// Build the asset to store. Editing keeps the edited asset's id.
    pub fn build(&self, editing: Option<&Asset>, now: DateTime<Utc>) -> Result<Asset, FormErrors> {
        self.validate()?;

        let mut asset = Asset::new(
            self.name.trim(),
            parse_positive(&self.value).unwrap_or_default(),
            self.is_home_equity,
            now,
        );
        if let Some(existing) = editing {
            asset.id = existing.id.clone();
        }
        Ok(asset)
    }
}

// ============================================================================
// DEBT FORM
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebtForm {
    pub name: String,
    pub balance: String,
    /// Optional; blank means no rate
    pub interest_rate: String,
}

impl DebtForm {
    pub fn from_debt(debt: &Debt) -> Self {
        DebtForm {
            name: debt.name.clone(),
            balance: debt.balance.to_string(),
            interest_rate: debt.interest_rate.map(|r| r.to_string()).unwrap_or_default(),
        }
    }

    fn parse_interest_rate(&self) -> Result<Option<f64>, ()> {
        let raw = self.interest_rate.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        match raw.parse::<f64>() {
            Ok(rate) if rate.is_finite() && rate >= 0.0 => Ok(Some(rate)),
            _ => Err(()),
        }
    }

    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        if self.name.trim().is_empty() {
            errors.insert("debtName", "Debt name is required");
        }
        if parse_positive(&self.balance).is_none() {
            errors.insert("balance", "Balance is required");
        }
        if self.parse_interest_rate().is_err() {
            errors.insert("interestRate", "Interest rate must be a valid number");
        }
        errors.into_result()
    }

    pub fn build(&self, editing: Option<&Debt>, now: DateTime<Utc>) -> Result<Debt, FormErrors> {
        self.validate()?;

        let mut debt = Debt::new(
            self.name.trim(),
            parse_positive(&self.balance).unwrap_or_default(),
            self.parse_interest_rate().ok().flatten(),
            now,
        );
        if let Some(existing) = editing {
            debt.id = existing.id.clone();
        }
        Ok(debt)
    }
}
