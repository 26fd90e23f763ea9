//! Store accounts and the operator session.
//!
//! Accounts live in a single process-wide directory document; the active
//! operator session is another single document, so at most one operator
//! is logged in per process. Passwords are bcrypt-hashed at registration
//! and verified on login.

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::DbState;
use crate::error::{Error, Result};
use crate::models::{StoreAccount, UserRole, UserSession};
use crate::storage;

/// Create a store account with a unique username. The account id doubles
/// as the store id scoping that store's collections.
pub fn register_store_account(
    db: &DbState,
    name: &str,
    username: &str,
    password: &str,
) -> Result<StoreAccount> {
    if name.trim().is_empty() || username.trim().is_empty() {
        return Err(Error::Validation("Nome e usuário obrigatórios".into()));
    }
    if password.len() < 4 {
        return Err(Error::Validation("Senha muito curta".into()));
    }

    let mut accounts = storage::load_accounts(db)?;
    if accounts
        .iter()
        .any(|a| a.username.eq_ignore_ascii_case(username.trim()))
    {
        return Err(Error::Validation(format!("Usuário já existe: {username}")));
    }

    let hashed =
        hash(password, DEFAULT_COST).map_err(|e| Error::Internal(format!("password hash: {e}")))?;

    let account = StoreAccount {
        id: format!("store_{}", Uuid::new_v4()),
        name: name.trim().to_string(),
        username: username.trim().to_string(),
        password: hashed,
        is_active: true,
        created_at: Utc::now().to_rfc3339(),
    };

    accounts.push(account.clone());
    storage::save_accounts(db, &accounts)?;
    info!(store_id = %account.id, username = %account.username, "Store account registered");

    Ok(account)
}

/// Verify credentials and open the operator session. Inactive accounts
/// and bad credentials fail the same way, without saying which.
pub fn operator_login(db: &DbState, username: &str, password: &str) -> Result<UserSession> {
    let accounts = storage::load_accounts(db)?;
    let account = accounts
        .iter()
        .find(|a| a.username.eq_ignore_ascii_case(username.trim()) && a.is_active);

    let Some(account) = account else {
        warn!(username = %username, "Login failed");
        return Err(Error::Validation("Usuário ou senha inválidos".into()));
    };

    let ok = verify(password, &account.password)
        .map_err(|e| Error::Internal(format!("password verify: {e}")))?;
    if !ok {
        warn!(username = %username, "Login failed");
        return Err(Error::Validation("Usuário ou senha inválidos".into()));
    }

    let session = UserSession {
        role: UserRole::Store,
        store_id: Some(account.id.clone()),
        store_name: Some(account.name.clone()),
        username: account.username.clone(),
    };
    storage::save_operator_session(db, &session)?;
    info!(store_id = ?session.store_id, username = %session.username, "Operator logged in");

    Ok(session)
}

pub fn operator_logout(db: &DbState) -> Result<()> {
    storage::clear_operator_session(db)
}

pub fn current_operator(db: &DbState) -> Result<Option<UserSession>> {
    storage::load_operator_session(db)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn register_hashes_password() {
        let db = db::test_state();
        let account = register_store_account(&db, "Pizzaria Bela", "bela", "segredo123")
            .expect("register");

        assert!(account.id.starts_with("store_"));
        assert_ne!(account.password, "segredo123");
        assert!(account.password.starts_with("$2"));
    }

    #[test]
    fn duplicate_username_rejected_case_insensitively() {
        let db = db::test_state();
        register_store_account(&db, "Pizzaria Bela", "bela", "segredo123").expect("first");

        let err = register_store_account(&db, "Outra Loja", "BELA", "outra456")
            .expect_err("duplicate");
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn login_opens_session_logout_clears_it() {
        let db = db::test_state();
        let account =
            register_store_account(&db, "Pizzaria Bela", "bela", "segredo123").expect("register");

        let session = operator_login(&db, "bela", "segredo123").expect("login");
        assert_eq!(session.role, UserRole::Store);
        assert_eq!(session.store_id.as_deref(), Some(account.id.as_str()));
        assert_eq!(
            current_operator(&db).expect("current").map(|s| s.username),
            Some("bela".to_string())
        );

        operator_logout(&db).expect("logout");
        assert!(current_operator(&db).expect("current").is_none());
    }

    #[test]
    fn wrong_password_and_unknown_user_fail_alike() {
        let db = db::test_state();
        register_store_account(&db, "Pizzaria Bela", "bela", "segredo123").expect("register");

        let err = operator_login(&db, "bela", "errada").expect_err("bad password");
        assert!(matches!(err, Error::Validation(_)));
        let err = operator_login(&db, "ninguem", "segredo123").expect_err("unknown user");
        assert!(matches!(err, Error::Validation(_)));
        assert!(current_operator(&db).expect("current").is_none());
    }

    #[test]
    fn inactive_account_cannot_login() {
        let db = db::test_state();
        register_store_account(&db, "Pizzaria Bela", "bela", "segredo123").expect("register");
        {
            let mut accounts = storage::load_accounts(&db).expect("load");
            accounts[0].is_active = false;
            storage::save_accounts(&db, &accounts).expect("save");
        }

        let err = operator_login(&db, "bela", "segredo123").expect_err("inactive");
        assert!(matches!(err, Error::Validation(_)));
    }
}
