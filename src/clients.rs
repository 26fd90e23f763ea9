//! Client directory keyed by normalized phone number.
//!
//! Registration is an idempotent upsert: the phone digits identify the
//! client, a repeat registration overwrites profile fields in place and
//! keeps the existing id, so order history stays attached across visits.

use tracing::info;
use uuid::Uuid;

use crate::db::DbState;
use crate::error::{Error, Result};
use crate::events::{ChangeEvent, ChangeNotifier};
use crate::models::{Address, Client};
use crate::storage;

/// Strip a phone number down to its digits for identity comparison, so
/// "(11) 99999-0000" and "11999990000" match the same client.
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Customer-submitted registration form.
#[derive(Debug, Clone)]
pub struct ClientRegistration {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub street: String,
    pub number: String,
    pub neighborhood: String,
    pub city: Option<String>,
    pub reference: Option<String>,
    pub distance_km: Option<f64>,
}

impl ClientRegistration {
    /// Reject blank required fields before anything is written.
    fn validate(&self) -> Result<()> {
        let required = [
            ("name", &self.name),
            ("phone", &self.phone),
            ("street", &self.street),
            ("number", &self.number),
            ("neighborhood", &self.neighborhood),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::Validation(format!("Campo obrigatório: {field}")));
            }
        }
        if normalize_phone(&self.phone).is_empty() {
            return Err(Error::Validation("Telefone inválido".into()));
        }
        Ok(())
    }

    fn address(&self) -> Address {
        Address {
            street: self.street.trim().to_string(),
            number: self.number.trim().to_string(),
            neighborhood: self.neighborhood.trim().to_string(),
            city: self.city.clone().unwrap_or_default(),
            zip_code: None,
            reference: self.reference.clone(),
            complement: None,
            formatted: Some(format!(
                "{}, {} - {}",
                self.street.trim(),
                self.number.trim(),
                self.neighborhood.trim()
            )),
        }
    }
}

/// Register or update a client by phone and open the customer session.
///
/// If a stored client matches the registration's phone digits, its
/// profile is overwritten but its id and wallet balance are preserved.
/// Otherwise a new client is minted. Either way the result becomes the
/// store's current customer session.
pub fn register_client(
    db: &DbState,
    notifier: &ChangeNotifier,
    store_id: &str,
    reg: &ClientRegistration,
) -> Result<Client> {
    reg.validate()?;

    let normalized = normalize_phone(&reg.phone);
    let mut clients = storage::load_clients(db, store_id)?;

    let existing_idx = clients
        .iter()
        .position(|c| normalize_phone(&c.phone) == normalized);
    let client = match existing_idx {
        Some(idx) => {
            let existing = &mut clients[idx];
            existing.name = reg.name.trim().to_string();
            existing.phone = reg.phone.trim().to_string();
            existing.email = reg.email.clone().unwrap_or_default();
            existing.address = reg.address();
            if reg.distance_km.is_some() {
                existing.distance_km = reg.distance_km;
            }
            info!(store_id = %store_id, client_id = %existing.id, "Updated returning client");
            existing.clone()
        }
        None => {
            let new_client = Client {
                id: format!("cli_{}", Uuid::new_v4()),
                name: reg.name.trim().to_string(),
                phone: reg.phone.trim().to_string(),
                email: reg.email.clone().unwrap_or_default(),
                address: reg.address(),
                distance_km: reg.distance_km,
                wallet_balance: 0.0,
                preferences: None,
            };
            info!(store_id = %store_id, client_id = %new_client.id, "Registered new client");
            clients.push(new_client.clone());
            new_client
        }
    };

    storage::save_clients(db, store_id, &clients)?;
    storage::save_customer_session(db, store_id, &client)?;
    notifier.notify(ChangeEvent::ClientsChanged {
        store_id: store_id.to_string(),
    });

    Ok(client)
}

/// The client currently identified for this store, if any.
pub fn current_customer(db: &DbState, store_id: &str) -> Result<Option<Client>> {
    storage::load_customer_session(db, store_id)
}

/// Forget the current customer. Order history is untouched.
pub fn logout_customer(db: &DbState, store_id: &str) -> Result<()> {
    storage::clear_customer_session(db, store_id)
}

pub fn list_clients(db: &DbState, store_id: &str) -> Result<Vec<Client>> {
    storage::load_clients(db, store_id)
}

/// Look a client up by phone digits without touching the session.
pub fn find_by_phone(db: &DbState, store_id: &str, phone: &str) -> Result<Option<Client>> {
    let normalized = normalize_phone(phone);
    let clients = storage::load_clients(db, store_id)?;
    Ok(clients
        .into_iter()
        .find(|c| normalize_phone(&c.phone) == normalized))
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn registration(name: &str, phone: &str) -> ClientRegistration {
        ClientRegistration {
            name: name.into(),
            phone: phone.into(),
            email: None,
            street: "Rua A".into(),
            number: "10".into(),
            neighborhood: "Centro".into(),
            city: Some("São Paulo".into()),
            reference: None,
            distance_km: Some(1.5),
        }
    }

    #[test]
    fn normalize_strips_formatting() {
        assert_eq!(normalize_phone("(11) 99999-0000"), "11999990000");
        assert_eq!(normalize_phone("11999990000"), "11999990000");
        assert_eq!(normalize_phone("+55 11 9.9999-0000"), "5511999990000");
    }

    #[test]
    fn registration_mints_client_and_opens_session() {
        let db = db::test_state();
        let notifier = ChangeNotifier::new();

        let client =
            register_client(&db, &notifier, "s1", &registration("Ana", "11999990000"))
                .expect("register");

        assert!(client.id.starts_with("cli_"));
        assert_eq!(client.address.formatted.as_deref(), Some("Rua A, 10 - Centro"));
        assert_eq!(
            current_customer(&db, "s1").expect("session").map(|c| c.id),
            Some(client.id)
        );
    }

    #[test]
    fn repeat_registration_is_idempotent_on_phone() {
        let db = db::test_state();
        let notifier = ChangeNotifier::new();

        let first = register_client(&db, &notifier, "s1", &registration("Ana", "11999990000"))
            .expect("first");

        // Same phone in a different formatting, new name and address
        let mut reg = registration("Ana Souza", "(11) 99999-0000");
        reg.street = "Rua Nova".into();
        let second = register_client(&db, &notifier, "s1", &reg).expect("second");

        assert_eq!(second.id, first.id, "identity keyed by phone digits");
        assert_eq!(second.name, "Ana Souza");
        assert_eq!(second.address.street, "Rua Nova");
        assert_eq!(list_clients(&db, "s1").expect("list").len(), 1);
    }

    #[test]
    fn blank_required_field_rejected_before_write() {
        let db = db::test_state();
        let notifier = ChangeNotifier::new();

        let mut reg = registration("Ana", "11999990000");
        reg.street = "   ".into();
        let err = register_client(&db, &notifier, "s1", &reg).expect_err("must fail");
        assert!(matches!(err, Error::Validation(_)));

        assert!(list_clients(&db, "s1").expect("list").is_empty());
        assert!(current_customer(&db, "s1").expect("session").is_none());
    }

    #[test]
    fn wallet_balance_survives_reregistration() {
        let db = db::test_state();
        let notifier = ChangeNotifier::new();

        register_client(&db, &notifier, "s1", &registration("Ana", "11999990000"))
            .expect("register");
        {
            let mut clients = storage::load_clients(&db, "s1").expect("load");
            clients[0].wallet_balance = 42.0;
            storage::save_clients(&db, "s1", &clients).expect("save");
        }

        let again = register_client(&db, &notifier, "s1", &registration("Ana", "11999990000"))
            .expect("reregister");
        assert_eq!(again.wallet_balance, 42.0);
    }

    #[test]
    fn logout_clears_session_only() {
        let db = db::test_state();
        let notifier = ChangeNotifier::new();

        register_client(&db, &notifier, "s1", &registration("Ana", "11999990000"))
            .expect("register");
        logout_customer(&db, "s1").expect("logout");

        assert!(current_customer(&db, "s1").expect("session").is_none());
        assert_eq!(list_clients(&db, "s1").expect("list").len(), 1);
    }

    #[test]
    fn find_by_phone_matches_digits() {
        let db = db::test_state();
        let notifier = ChangeNotifier::new();
        register_client(&db, &notifier, "s1", &registration("Ana", "(11) 99999-0000"))
            .expect("register");

        let found = find_by_phone(&db, "s1", "11999990000").expect("find");
        assert!(found.is_some());
        assert!(find_by_phone(&db, "s1", "11888880000")
            .expect("find")
            .is_none());
    }
}
