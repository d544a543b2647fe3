use std::rc::Rc;
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use crate::ids::IdGenerator;
use crate::models::{NewUser, ProfileUpdate, RegisteredUser, User};
use crate::storage::{CURRENT_USER_KEY, KeyValueStore, USERS_KEY, read_json, write_json};

/// Owns the user registry and the current session.
pub struct AuthStore {
    users: Vec<RegisteredUser>,
    session: Option<User>,
    storage: Rc<dyn KeyValueStore>,
    ids: Rc<dyn IdGenerator>,
}

impl AuthStore {
    pub fn load(storage: Rc<dyn KeyValueStore>, ids: Rc<dyn IdGenerator>) -> Result<Self> {
        let users: Vec<RegisteredUser> =
            read_json(storage.as_ref(), USERS_KEY)?.unwrap_or_default();
        let session: Option<User> = read_json(storage.as_ref(), CURRENT_USER_KEY)?;
        for registered in &users {
            ids.reserve(&registered.user.id);
        }
        debug!(
            users = users.len(),
            session = session.as_ref().map(|u| u.id.as_str()),
            "loaded auth state"
        );
        Ok(Self {
            users,
            session,
            storage,
            ids,
        })
    }

    pub fn current_user(&self) -> Option<&User> {
        self.session.as_ref()
    }

    pub fn find_user(&self, id: &str) -> Option<&User> {
        self.users.iter().map(|r| &r.user).find(|u| u.id == id)
    }

    /// Exact, case-sensitive credential match. A miss says nothing about which
    /// half was wrong.
    pub fn login(&mut self, email: &str, password: &str) -> Result<bool> {
        let Some(found) = find_by_credentials(&self.users, email, password) else {
            warn!(email, "login rejected");
            return Ok(false);
        };
        let user = found.user.clone();
        info!(user_id = %user.id, "logged in");
        self.start_session(user)?;
        Ok(true)
    }

    /// Returns false when the email is already registered.
    pub fn register(&mut self, new_user: NewUser) -> Result<bool> {
        if email_taken(&self.users, &new_user.email, None) {
            warn!(email = %new_user.email, "registration rejected: email in use");
            return Ok(false);
        }
        let registered = new_user.into_registered(self.ids.next_id());
        let user = registered.user.clone();
        self.users.push(registered);
        self.save_users()?;
        info!(user_id = %user.id, role = %user.role, "registered user");
        self.start_session(user)?;
        Ok(true)
    }

    pub fn logout(&mut self) -> Result<()> {
        if let Some(user) = self.session.take() {
            info!(user_id = %user.id, "logged out");
        }
        self.storage.remove(CURRENT_USER_KEY)
    }

    /// Merges `update` into the session copy and the matching registry record.
    /// Returns false (and writes nothing) when nobody is logged in.
    pub fn update_profile(&mut self, update: &ProfileUpdate) -> Result<bool> {
        let Some(session) = self.session.as_mut() else {
            return Ok(false);
        };
        if let Some(email) = &update.email {
            if email_taken(&self.users, email, Some(session.id.as_str())) {
                return Err(StoreError::Conflict(format!("email {} is already registered", email)));
            }
        }

        update.apply_to(session);
        write_json(self.storage.as_ref(), CURRENT_USER_KEY, &*session)?;

        let id = session.id.clone();
        let in_registry = match self.users.iter_mut().find(|r| r.user.id == id) {
            Some(registered) => {
                update.apply_to(&mut registered.user);
                true
            }
            None => false,
        };
        if in_registry {
            self.save_users()?;
        }
        info!(user_id = %id, "profile updated");
        Ok(true)
    }

    fn start_session(&mut self, user: User) -> Result<()> {
        write_json(self.storage.as_ref(), CURRENT_USER_KEY, &user)?;
        self.session = Some(user);
        Ok(())
    }

    fn save_users(&self) -> Result<()> {
        write_json(self.storage.as_ref(), USERS_KEY, &self.users)
    }
}

fn find_by_credentials<'a>(
    users: &'a [RegisteredUser],
    email: &str,
    password: &str,
) -> Option<&'a RegisteredUser> {
    users
        .iter()
        .find(|r| r.user.email == email && r.password == password)
}

fn email_taken(users: &[RegisteredUser], email: &str, except_id: Option<&str>) -> bool {
    users
        .iter()
        .any(|r| r.user.email == email && Some(r.user.id.as_str()) != except_id)
}
