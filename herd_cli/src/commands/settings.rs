//! Per-user settings, keyed by the stored username.

use super::{FlowError, FlowResult};
use crate::app::App;
use herd_http::{Call, Operation};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsSection {
    Profile,
    Account,
    Notifications,
}

impl SettingsSection {
    fn load_operation(self) -> Operation {
        match self {
            SettingsSection::Profile => Operation::GetProfile,
            SettingsSection::Account => Operation::GetAccount,
            SettingsSection::Notifications => Operation::GetNotifications,
        }
    }

    fn update_operation(self) -> Operation {
        match self {
            SettingsSection::Profile => Operation::UpdateProfile,
            SettingsSection::Account => Operation::UpdateAccount,
            SettingsSection::Notifications => Operation::UpdateNotifications,
        }
    }

    /// Key the updated section comes back under.
    pub fn key(self) -> &'static str {
        match self {
            SettingsSection::Profile => "profile",
            SettingsSection::Account => "account",
            SettingsSection::Notifications => "notifications",
        }
    }
}

impl fmt::Display for SettingsSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SettingsSection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "profile" => Ok(SettingsSection::Profile),
            "account" => Ok(SettingsSection::Account),
            "notifications" => Ok(SettingsSection::Notifications),
            other => Err(format!("unknown settings section: {}", other)),
        }
    }
}

impl App {
    fn current_username(&self) -> FlowResult<String> {
        self.session.username().ok_or(FlowError::NotSignedIn)
    }

    pub async fn load_settings(&self, section: SettingsSection) -> FlowResult<Value> {
        let username = self.current_username()?;
        Ok(self
            .api
            .call(section.load_operation(), Call::new().query("username", &username))
            .await?)
    }

    /// Save a section and return its new state. A profile update that
    /// renames the user also renames the stored session.
    pub async fn update_settings(
        &self,
        section: SettingsSection,
        changes: Value,
    ) -> FlowResult<Value> {
        let username = self.current_username()?;
        let data = self
            .api
            .call(
                section.update_operation(),
                Call::new()
                    .query("username", &username)
                    .json(changes.clone()),
            )
            .await?;

        if section == SettingsSection::Profile {
            let renamed = changes
                .get("username")
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty() && *name != username);
            if let Some(name) = renamed {
                self.session.set_username(name)?;
            }
        }

        Ok(data.get(section.key()).cloned().unwrap_or(data))
    }

    pub async fn change_password(&self, current: &str, new: &str) -> FlowResult<Value> {
        let username = self.current_username()?;
        Ok(self
            .api
            .call(
                Operation::ChangePassword,
                Call::new()
                    .query("username", &username)
                    .json(json!({"current_password": current, "new_password": new})),
            )
            .await?)
    }
}
