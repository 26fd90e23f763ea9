//! Per-store settings management.
//!
//! Settings are one whole document per store. Updates are merge-style: the
//! caller supplies only the fields to change and everything else is kept.
//! The manager password is bcrypt-hashed before it ever reaches the
//! document; the plaintext is never stored.

use std::cmp::Ordering;

use bcrypt::{hash, DEFAULT_COST};
use tracing::info;
use uuid::Uuid;

use crate::db::DbState;
use crate::error::{Error, Result};
use crate::events::{ChangeEvent, ChangeNotifier};
use crate::models::{DeliveryRange, FeeMode, Integrations, StoreSettings};
use crate::storage;

/// Which of the two tier lists an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeSchedule {
    /// Customer-facing delivery charge (`deliveryRanges`).
    Customer,
    /// Internal driver payout (`driverFeeRanges`).
    Driver,
}

/// Partial settings update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub logo_url: Option<String>,
    /// Plaintext manager password, hashed before persisting.
    pub manager_password: Option<String>,
    pub integrations: Option<Integrations>,
    pub fee_mode: Option<FeeMode>,
    pub flat_delivery_fee: Option<f64>,
}

/// The store's settings document, or the defaults when none was saved yet.
pub fn load_or_default(db: &DbState, store_id: &str) -> Result<StoreSettings> {
    Ok(storage::load_settings(db, store_id)?.unwrap_or_default())
}

/// Merge `update` into the stored settings and persist.
pub fn update_settings(
    db: &DbState,
    notifier: &ChangeNotifier,
    store_id: &str,
    update: SettingsUpdate,
) -> Result<StoreSettings> {
    if let Some(fee) = update.flat_delivery_fee {
        if fee < 0.0 {
            return Err(Error::Validation("Taxa de entrega não pode ser negativa".into()));
        }
    }

    let mut settings = load_or_default(db, store_id)?;

    if let Some(name) = update.name {
        settings.name = name;
    }
    if let Some(address) = update.address {
        settings.address = address;
    }
    if let Some(logo_url) = update.logo_url {
        settings.logo_url = Some(logo_url);
    }
    if let Some(plaintext) = update.manager_password {
        if plaintext.trim().is_empty() {
            return Err(Error::Validation("Senha do gerente vazia".into()));
        }
        let hashed = hash(plaintext, DEFAULT_COST)
            .map_err(|e| Error::Internal(format!("password hash: {e}")))?;
        settings.manager_password = Some(hashed);
    }
    if let Some(integrations) = update.integrations {
        settings.integrations = integrations;
    }
    if let Some(fee_mode) = update.fee_mode {
        settings.fee_mode = fee_mode;
    }
    if let Some(fee) = update.flat_delivery_fee {
        settings.flat_delivery_fee = fee;
    }

    storage::save_settings(db, store_id, &settings)?;
    info!(store_id = %store_id, "Settings updated");
    notifier.notify(ChangeEvent::SettingsChanged {
        store_id: store_id.to_string(),
    });

    Ok(settings)
}

/// Add a fee tier to one of the schedules, keeping the list sorted
/// ascending by `min_km`.
pub fn add_fee_range(
    db: &DbState,
    notifier: &ChangeNotifier,
    store_id: &str,
    schedule: FeeSchedule,
    min_km: f64,
    max_km: f64,
    price: f64,
) -> Result<StoreSettings> {
    if !(min_km >= 0.0 && max_km >= min_km) {
        return Err(Error::Validation("Faixa de distância inválida".into()));
    }
    if price < 0.0 {
        return Err(Error::Validation("Preço da faixa não pode ser negativo".into()));
    }

    let mut settings = load_or_default(db, store_id)?;
    let range = DeliveryRange {
        id: Uuid::new_v4().to_string(),
        min_km,
        max_km,
        price,
    };

    let tiers = schedule_mut(&mut settings, schedule);
    tiers.push(range);
    tiers.sort_by(|a, b| a.min_km.partial_cmp(&b.min_km).unwrap_or(Ordering::Equal));

    storage::save_settings(db, store_id, &settings)?;
    notifier.notify(ChangeEvent::SettingsChanged {
        store_id: store_id.to_string(),
    });
    Ok(settings)
}

/// Remove a tier by id. Unknown ids are a not-found error.
pub fn remove_fee_range(
    db: &DbState,
    notifier: &ChangeNotifier,
    store_id: &str,
    schedule: FeeSchedule,
    range_id: &str,
) -> Result<StoreSettings> {
    let mut settings = load_or_default(db, store_id)?;

    let tiers = schedule_mut(&mut settings, schedule);
    let before = tiers.len();
    tiers.retain(|t| t.id != range_id);
    if tiers.len() == before {
        return Err(Error::NotFound(format!("fee range {range_id}")));
    }

    storage::save_settings(db, store_id, &settings)?;
    notifier.notify(ChangeEvent::SettingsChanged {
        store_id: store_id.to_string(),
    });
    Ok(settings)
}

fn schedule_mut(settings: &mut StoreSettings, schedule: FeeSchedule) -> &mut Vec<DeliveryRange> {
    match schedule {
        FeeSchedule::Customer => &mut settings.delivery_ranges,
        FeeSchedule::Driver => &mut settings.driver_fee_ranges,
    }
}

/// Check a plaintext attempt against the stored manager password hash.
/// A store with no password set rejects every attempt.
pub fn verify_manager_password(db: &DbState, store_id: &str, attempt: &str) -> Result<bool> {
    let settings = load_or_default(db, store_id)?;
    match settings.manager_password {
        Some(ref hashed) => bcrypt::verify(attempt, hashed)
            .map_err(|e| Error::Internal(format!("password verify: {e}"))),
        None => Ok(false),
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn missing_document_yields_defaults() {
        let db = db::test_state();
        let settings = load_or_default(&db, "s1").expect("load");
        assert_eq!(settings.fee_mode, FeeMode::Flat);
        assert_eq!(settings.flat_delivery_fee, 5.0);
    }

    #[test]
    fn update_merges_only_provided_fields() {
        let db = db::test_state();
        let notifier = ChangeNotifier::new();

        update_settings(
            &db,
            &notifier,
            "s1",
            SettingsUpdate {
                name: Some("Pizzaria Bela".into()),
                flat_delivery_fee: Some(7.0),
                ..SettingsUpdate::default()
            },
        )
        .expect("first update");

        let settings = update_settings(
            &db,
            &notifier,
            "s1",
            SettingsUpdate {
                address: Some("Av. Central, 100".into()),
                ..SettingsUpdate::default()
            },
        )
        .expect("second update");

        assert_eq!(settings.name, "Pizzaria Bela");
        assert_eq!(settings.address, "Av. Central, 100");
        assert_eq!(settings.flat_delivery_fee, 7.0);
    }

    #[test]
    fn manager_password_stored_hashed() {
        let db = db::test_state();
        let notifier = ChangeNotifier::new();

        update_settings(
            &db,
            &notifier,
            "s1",
            SettingsUpdate {
                manager_password: Some("segredo123".into()),
                ..SettingsUpdate::default()
            },
        )
        .expect("update");

        let stored = load_or_default(&db, "s1")
            .expect("load")
            .manager_password
            .expect("password set");
        assert_ne!(stored, "segredo123");
        assert!(stored.starts_with("$2"));

        assert!(verify_manager_password(&db, "s1", "segredo123").expect("verify"));
        assert!(!verify_manager_password(&db, "s1", "errada").expect("verify"));
    }

    #[test]
    fn no_password_rejects_all_attempts() {
        let db = db::test_state();
        assert!(!verify_manager_password(&db, "s1", "qualquer").expect("verify"));
    }

    #[test]
    fn ranges_kept_sorted_by_min_km() {
        let db = db::test_state();
        let notifier = ChangeNotifier::new();

        add_fee_range(&db, &notifier, "s1", FeeSchedule::Customer, 2.0, 5.0, 8.0)
            .expect("add far");
        let settings = add_fee_range(&db, &notifier, "s1", FeeSchedule::Customer, 0.0, 2.0, 5.0)
            .expect("add near");

        let mins: Vec<f64> = settings.delivery_ranges.iter().map(|r| r.min_km).collect();
        assert_eq!(mins, vec![0.0, 2.0]);
    }

    #[test]
    fn schedules_are_independent() {
        let db = db::test_state();
        let notifier = ChangeNotifier::new();

        add_fee_range(&db, &notifier, "s1", FeeSchedule::Customer, 0.0, 5.0, 9.0)
            .expect("customer tier");
        let settings = add_fee_range(&db, &notifier, "s1", FeeSchedule::Driver, 0.0, 5.0, 6.0)
            .expect("driver tier");

        assert_eq!(settings.delivery_ranges.len(), 1);
        assert_eq!(settings.driver_fee_ranges.len(), 1);
        assert_eq!(settings.delivery_ranges[0].price, 9.0);
        assert_eq!(settings.driver_fee_ranges[0].price, 6.0);
    }

    #[test]
    fn invalid_range_rejected() {
        let db = db::test_state();
        let notifier = ChangeNotifier::new();

        let err = add_fee_range(&db, &notifier, "s1", FeeSchedule::Customer, 5.0, 2.0, 8.0)
            .expect_err("inverted bounds");
        assert!(matches!(err, Error::Validation(_)));

        let err = add_fee_range(&db, &notifier, "s1", FeeSchedule::Customer, 0.0, 2.0, -1.0)
            .expect_err("negative price");
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn remove_unknown_range_is_not_found() {
        let db = db::test_state();
        let notifier = ChangeNotifier::new();

        let settings = add_fee_range(&db, &notifier, "s1", FeeSchedule::Driver, 0.0, 3.0, 7.0)
            .expect("add");
        let id = settings.driver_fee_ranges[0].id.clone();

        let settings = remove_fee_range(&db, &notifier, "s1", FeeSchedule::Driver, &id)
            .expect("remove");
        assert!(settings.driver_fee_ranges.is_empty());

        let err = remove_fee_range(&db, &notifier, "s1", FeeSchedule::Driver, &id)
            .expect_err("already gone");
        assert!(matches!(err, Error::NotFound(_)));
    }
}
