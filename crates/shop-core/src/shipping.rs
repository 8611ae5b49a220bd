//! # Shipping Input Validation and Pending Checkout State
//!
//! Validation is an explicit step, separate from persistence:
//! `ShippingForm::validate` returns a `CleanShipping` that later steps may
//! assume is well-formed. The cleaned data rides two channels between
//! intent creation and verification: the in-process pending store
//! (opportunistic) and the gateway intent notes (the recovery channel when
//! session state is lost on redirect).

use crate::cart::UserId;
use crate::error::{ShopError, ShopResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

/// States accepted by the shipping form (fixed enumerated set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum State {
    AndhraPradesh,
    ArunachalPradesh,
    Assam,
    Bihar,
    Chhattisgarh,
    Delhi,
    Goa,
    Gujarat,
    Haryana,
    HimachalPradesh,
    Jharkhand,
    Karnataka,
    Kerala,
    MadhyaPradesh,
    Maharashtra,
    Manipur,
    Meghalaya,
    Mizoram,
    Nagaland,
    Odisha,
    Punjab,
    Rajasthan,
    Sikkim,
    TamilNadu,
    Telangana,
    Tripura,
    UttarPradesh,
    Uttarakhand,
    WestBengal,
}

impl State {
    /// Display name as it appears on the form
    pub fn name(&self) -> &'static str {
        match self {
            State::AndhraPradesh => "Andhra Pradesh",
            State::ArunachalPradesh => "Arunachal Pradesh",
            State::Assam => "Assam",
            State::Bihar => "Bihar",
            State::Chhattisgarh => "Chhattisgarh",
            State::Delhi => "Delhi",
            State::Goa => "Goa",
            State::Gujarat => "Gujarat",
            State::Haryana => "Haryana",
            State::HimachalPradesh => "Himachal Pradesh",
            State::Jharkhand => "Jharkhand",
            State::Karnataka => "Karnataka",
            State::Kerala => "Kerala",
            State::MadhyaPradesh => "Madhya Pradesh",
            State::Maharashtra => "Maharashtra",
            State::Manipur => "Manipur",
            State::Meghalaya => "Meghalaya",
            State::Mizoram => "Mizoram",
            State::Nagaland => "Nagaland",
            State::Odisha => "Odisha",
            State::Punjab => "Punjab",
            State::Rajasthan => "Rajasthan",
            State::Sikkim => "Sikkim",
            State::TamilNadu => "Tamil Nadu",
            State::Telangana => "Telangana",
            State::Tripura => "Tripura",
            State::UttarPradesh => "Uttar Pradesh",
            State::Uttarakhand => "Uttarakhand",
            State::WestBengal => "West Bengal",
        }
    }

    /// Parse a form value, case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        const ALL: &[State] = &[
            State::AndhraPradesh,
            State::ArunachalPradesh,
            State::Assam,
            State::Bihar,
            State::Chhattisgarh,
            State::Delhi,
            State::Goa,
            State::Gujarat,
            State::Haryana,
            State::HimachalPradesh,
            State::Jharkhand,
            State::Karnataka,
            State::Kerala,
            State::MadhyaPradesh,
            State::Maharashtra,
            State::Manipur,
            State::Meghalaya,
            State::Mizoram,
            State::Nagaland,
            State::Odisha,
            State::Punjab,
            State::Rajasthan,
            State::Sikkim,
            State::TamilNadu,
            State::Telangana,
            State::Tripura,
            State::UttarPradesh,
            State::Uttarakhand,
            State::WestBengal,
        ];
        let trimmed = value.trim();
        ALL.iter()
            .copied()
            .find(|s| s.name().eq_ignore_ascii_case(trimmed))
    }
}

/// Raw shipping form input, as posted by the client
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShippingForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zipcode: String,
}

/// Validated shipping data; later steps assume these fields are well-formed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanShipping {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Exactly 10 digits, non-digits stripped
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: State,
    /// Exactly 6 digits
    pub zipcode: String,
}

impl ShippingForm {
    /// Validate and normalize the form. Field-level errors so the caller
    /// can correct input.
    pub fn validate(&self) -> ShopResult<CleanShipping> {
        let first_name = required("first_name", &self.first_name)?;
        let last_name = required("last_name", &self.last_name)?;

        let email = required("email", &self.email)?;
        let at = email.find('@');
        match at {
            Some(pos) if pos > 0 && pos + 1 < email.len() => {}
            _ => return Err(ShopError::validation("email", "Enter a valid email address.")),
        }

        let digits: String = self.phone.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() != 10 {
            return Err(ShopError::validation(
                "phone",
                "Enter a valid 10-digit phone number.",
            ));
        }

        let address = required("address", &self.address)?;
        let city = required("city", &self.city)?;

        let state = State::parse(&self.state)
            .ok_or_else(|| ShopError::validation("state", "Select a valid state."))?;

        let zipcode = self.zipcode.trim();
        if zipcode.len() != 6 || !zipcode.chars().all(|c| c.is_ascii_digit()) {
            return Err(ShopError::validation(
                "zipcode",
                "ZIP code must be exactly 6 digits.",
            ));
        }

        Ok(CleanShipping {
            first_name,
            last_name,
            email,
            phone: digits,
            address,
            city,
            state,
            zipcode: zipcode.to_string(),
        })
    }
}

fn required(field: &str, value: &str) -> ShopResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ShopError::validation(field, "This field is required."));
    }
    Ok(trimmed.to_string())
}

impl CleanShipping {
    /// Flatten into gateway intent notes. Together with the user id these
    /// notes are the recovery channel used when the pending store entry is
    /// gone by the time the callback arrives.
    pub fn to_notes(&self) -> HashMap<String, String> {
        HashMap::from([
            ("shipping_first_name".to_string(), self.first_name.clone()),
            ("shipping_last_name".to_string(), self.last_name.clone()),
            ("shipping_email".to_string(), self.email.clone()),
            ("shipping_phone_number".to_string(), self.phone.clone()),
            ("shipping_address".to_string(), self.address.clone()),
            ("shipping_city".to_string(), self.city.clone()),
            ("shipping_state".to_string(), self.state.name().to_string()),
            ("shipping_zipcode".to_string(), self.zipcode.clone()),
        ])
    }
}

/// Shipping record attached to a completed order. Stored as plain strings;
/// the aggregate is immutable once written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
}

impl From<CleanShipping> for ShippingInfo {
    fn from(clean: CleanShipping) -> Self {
        Self {
            first_name: clean.first_name,
            last_name: clean.last_name,
            email: clean.email,
            phone: clean.phone,
            address: clean.address,
            city: clean.city,
            state: clean.state.name().to_string(),
            zipcode: clean.zipcode,
        }
    }
}

impl ShippingInfo {
    /// Rebuild shipping info from gateway intent notes. Missing keys come
    /// back empty rather than failing: by this point the payment has been
    /// captured and the order must be written regardless.
    pub fn from_notes(notes: &HashMap<String, String>) -> Self {
        let get = |k: &str| notes.get(k).cloned().unwrap_or_default();
        Self {
            first_name: get("shipping_first_name"),
            last_name: get("shipping_last_name"),
            email: get("shipping_email"),
            phone: get("shipping_phone_number"),
            address: get("shipping_address"),
            city: get("shipping_city"),
            state: get("shipping_state"),
            zipcode: get("shipping_zipcode"),
        }
    }
}

/// Ephemeral checkout state stashed between intent creation and
/// verification, keyed by user. Consumed (removed) at verification; its
/// absence is normal and handled by the notes fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingCheckoutState {
    pub intent_id: String,
    pub shipping: CleanShipping,
    pub created_at: DateTime<Utc>,
}

/// In-memory store for pending checkout state. No concurrency guarantee is
/// needed here: losing an entry under a race only routes verification
/// through the notes fallback.
#[derive(Debug, Default)]
pub struct PendingStore {
    entries: Mutex<HashMap<UserId, PendingCheckoutState>>,
}

impl PendingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stash pending state for a user, replacing any previous attempt
    pub fn put(&self, user: UserId, state: PendingCheckoutState) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(user, state);
    }

    /// Consume the pending state for a user, if any
    pub fn take(&self, user: UserId) -> Option<PendingCheckoutState> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&user)
    }
}
