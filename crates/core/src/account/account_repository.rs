//! Maps [`AccountState`] onto the persisted local keys.

use log::{debug, warn};
use std::sync::Arc;

use super::account_model::AccountState;
use super::store::KeyValueStore;
use crate::errors::Result;
use crate::plans::PlanTier;

pub const USER_ID_KEY: &str = "userId";
pub const USER_EMAIL_KEY: &str = "userEmail";
pub const SELECTED_PLAN_KEY: &str = "selectedPlan";
pub const CURRENT_PLAN_KEY: &str = "currentPlan";
pub const PLAN_LIMIT_KEY: &str = "planLimit";

#[derive(Clone)]
pub struct AccountRepository {
    store: Arc<dyn KeyValueStore>,
}

impl AccountRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Loads the persisted account, if a user id was ever stored.
    pub fn load(&self) -> Result<Option<AccountState>> {
        let Some(user_id) = self.store.get_value(USER_ID_KEY)? else {
            return Ok(None);
        };

        let selected_plan = match self.store.get_value(SELECTED_PLAN_KEY)? {
            Some(name) => name.parse::<PlanTier>().unwrap_or_else(|_| {
                warn!(
                    "[Storage] Ignoring unknown persisted plan '{}', using {}",
                    name,
                    PlanTier::default()
                );
                PlanTier::default()
            }),
            None => PlanTier::default(),
        };

        let account = AccountState::new(user_id, selected_plan)
            .with_email(self.store.get_value(USER_EMAIL_KEY)?)
            .with_current_plan(self.store.get_value(CURRENT_PLAN_KEY)?);
        debug!(
            "[Storage] Loaded account user_id={} plan={}",
            account.user_id(),
            account.selected_plan()
        );
        Ok(Some(account))
    }

    /// Loads the persisted account or starts a fresh one for `user_id`.
    ///
    /// An explicitly configured id that differs from the persisted one wins and
    /// resets the account to defaults.
    pub fn load_or_init(&self, user_id: Option<&str>, fallback_id: &str) -> Result<AccountState> {
        let account = match (self.load()?, user_id) {
            (Some(account), Some(id)) if account.user_id() == id => account,
            (Some(account), None) => account,
            (_, Some(id)) => AccountState::new(id, PlanTier::default()),
            (None, None) => AccountState::new(fallback_id, PlanTier::default()),
        };
        self.save(&account)?;
        Ok(account)
    }

    pub fn save(&self, account: &AccountState) -> Result<()> {
        self.store.set_value(USER_ID_KEY, account.user_id())?;
        self.store
            .set_value(SELECTED_PLAN_KEY, account.selected_plan().as_str())?;
        self.store
            .set_value(PLAN_LIMIT_KEY, &account.plan_limit().to_string())?;
        match account.user_email() {
            Some(email) => self.store.set_value(USER_EMAIL_KEY, email)?,
            None => self.store.delete_value(USER_EMAIL_KEY)?,
        }
        match account.current_plan() {
            Some(plan) => self.store.set_value(CURRENT_PLAN_KEY, plan)?,
            None => self.store.delete_value(CURRENT_PLAN_KEY)?,
        }
        Ok(())
    }
}
