//! Persistence seam for user accounts.
//!
//! `InMemoryUserStore` backs the bundled server and tests. Usernames are
//! claimed through a separate index so two concurrent signups for the same
//! name cannot both succeed.

use chrono::Utc;
use dashmap::{DashMap, Entry};
use log::debug;

use crate::error::{AppError, AppResult};
use crate::models::user::UserRecord;

pub trait UserStore: Send + Sync {
    fn lookup_by_username(&self, username: &str) -> AppResult<UserRecord>;
    fn get_by_id(&self, user_id: &str) -> AppResult<UserRecord>;
    fn list(&self) -> AppResult<Vec<UserRecord>>;
    fn insert(&self, user: UserRecord) -> AppResult<UserRecord>;
    /// Replace a stored record. The username is fixed at signup.
    fn update(&self, user: UserRecord) -> AppResult<UserRecord>;
    fn delete(&self, user_id: &str) -> AppResult<()>;
    fn mark_email_confirmed(&self, user_id: &str) -> AppResult<UserRecord>;
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: DashMap<String, UserRecord>,
    // username -> user id
    usernames: DashMap<String, String>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_registered() -> AppError {
    AppError::NotFound("User is not registered".to_string())
}

impl UserStore for InMemoryUserStore {
    fn lookup_by_username(&self, username: &str) -> AppResult<UserRecord> {
        let user_id = self
            .usernames
            .get(username)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("Username {} is not registered", username)))?;
        self.get_by_id(&user_id)
    }

    fn get_by_id(&self, user_id: &str) -> AppResult<UserRecord> {
        self.users
            .get(user_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(not_registered)
    }

    fn list(&self) -> AppResult<Vec<UserRecord>> {
        let mut users: Vec<UserRecord> = self.users.iter().map(|entry| entry.value().clone()).collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(users)
    }

    fn insert(&self, user: UserRecord) -> AppResult<UserRecord> {
        match self.usernames.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(AppError::BadRequest(format!("User {} already exists", user.username))),
            Entry::Vacant(slot) => {
                debug!("Inserting user {}", user.id);
                self.users.insert(user.id.clone(), user.clone());
                slot.insert(user.id.clone());
                Ok(user)
            }
        }
    }

    fn update(&self, user: UserRecord) -> AppResult<UserRecord> {
        let mut entry = self.users.get_mut(&user.id).ok_or_else(not_registered)?;
        if entry.value().username != user.username {
            return Err(AppError::Validation("Can't modify username".to_string()));
        }
        debug!("Updating user {}", user.id);
        *entry.value_mut() = user.clone();
        Ok(user)
    }

    fn delete(&self, user_id: &str) -> AppResult<()> {
        let (_, user) = self.users.remove(user_id).ok_or_else(not_registered)?;
        self.usernames.remove_if(&user.username, |_, owner| owner == user_id);
        debug!("Deleted user {}", user_id);
        Ok(())
    }

    fn mark_email_confirmed(&self, user_id: &str) -> AppResult<UserRecord> {
        let mut entry = self
            .users
            .get_mut(user_id)
            .ok_or_else(not_registered)?;

        let user = entry.value_mut();
        if !user.confirmed {
            user.confirmed = true;
            user.confirmed_at = Some(Utc::now().timestamp());
        }
        Ok(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(id: &str, username: &str) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            username: username.to_string(),
            password_hash: "hash".to_string(),
            salt: "salt".to_string(),
            confirmed: false,
            confirmed_at: None,
            created_at: 0,
        }
    }

    #[test]
    fn usernames_are_unique() {
        let store = InMemoryUserStore::new();
        store.insert(record("1", "ana@example.com")).unwrap();
        assert!(matches!(
            store.insert(record("2", "ana@example.com")),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn confirm_flips_flag_once() {
        let store = InMemoryUserStore::new();
        store.insert(record("1", "ana@example.com")).unwrap();

        let confirmed = store.mark_email_confirmed("1").unwrap();
        assert!(confirmed.confirmed);
        let first_at = confirmed.confirmed_at;

        let again = store.mark_email_confirmed("1").unwrap();
        assert_eq!(again.confirmed_at, first_at);
        assert!(store.lookup_by_username("ana@example.com").unwrap().confirmed);
    }

    #[test]
    fn concurrent_signups_claim_a_username_once() {
        use std::sync::{Arc, Barrier};
        use std::thread;

        for round in 0..50 {
            let store = Arc::new(InMemoryUserStore::new());
            let barrier = Arc::new(Barrier::new(8));

            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let store = Arc::clone(&store);
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        barrier.wait();
                        store.insert(record(&format!("{}-{}", round, i), "ana")).is_ok()
                    })
                })
                .collect();

            let created = handles.into_iter().map(|h| h.join().unwrap()).filter(|ok| *ok).count();
            assert_eq!(created, 1, "round {}", round);
            assert_eq!(store.list().unwrap().len(), 1);
        }
    }

    #[test]
    fn update_keeps_username_fixed() {
        let store = InMemoryUserStore::new();
        let mut user = store.insert(record("1", "ana@example.com")).unwrap();

        user.password_hash = "new-hash".to_string();
        assert_eq!(store.update(user.clone()).unwrap().password_hash, "new-hash");
        assert_eq!(store.lookup_by_username("ana@example.com").unwrap().password_hash, "new-hash");

        user.username = "bo@example.com".to_string();
        assert!(matches!(store.update(user), Err(AppError::Validation(_))));
    }

    #[test]
    fn delete_frees_the_username() {
        let store = InMemoryUserStore::new();
        store.insert(record("1", "ana@example.com")).unwrap();

        store.delete("1").unwrap();
        assert!(matches!(store.get_by_id("1"), Err(AppError::NotFound(_))));
        assert!(matches!(store.lookup_by_username("ana@example.com"), Err(AppError::NotFound(_))));
        assert!(matches!(store.delete("1"), Err(AppError::NotFound(_))));

        store.insert(record("2", "ana@example.com")).unwrap();
        assert_eq!(store.lookup_by_username("ana@example.com").unwrap().id, "2");
    }

    #[test]
    fn list_is_ordered_by_creation() {
        let store = InMemoryUserStore::new();
        let mut late = record("a", "late@example.com");
        late.created_at = 20;
        let mut early = record("b", "early@example.com");
        early.created_at = 10;
        store.insert(late).unwrap();
        store.insert(early).unwrap();

        let ids: Vec<String> = store.list().unwrap().into_iter().map(|u| u.id).collect();
        assert_eq!(ids, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn unknown_users_are_not_found() {
        let store = InMemoryUserStore::new();
        assert!(matches!(store.get_by_id("x"), Err(AppError::NotFound(_))));
        assert!(matches!(store.mark_email_confirmed("x"), Err(AppError::NotFound(_))));
        assert!(matches!(store.lookup_by_username("x"), Err(AppError::NotFound(_))));
        assert!(matches!(store.update(record("x", "x")), Err(AppError::NotFound(_))));
    }
}
