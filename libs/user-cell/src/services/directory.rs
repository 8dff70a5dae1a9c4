use serde_json::json;
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::supabase::{eq, SupabaseClient};
use shared_models::auth::{Role, UserProfile};

use crate::models::{DoctorSummary, UserAdminError};

const USERS: &str = "users";
const PROFILE_COLUMNS: &str = "id,name,last_name,email,role";

pub struct UserDirectoryService {
    supabase: SupabaseClient,
}

impl UserDirectoryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list_doctors(&self) -> Result<Vec<DoctorSummary>, UserAdminError> {
        let query = format!(
            "role={}&select=id,name,last_name&order=last_name.asc,name.asc",
            eq(Role::Doctor)
        );
        Ok(self.supabase.select(USERS, &query).await?)
    }

    pub async fn list_users(&self) -> Result<Vec<UserProfile>, UserAdminError> {
        let query = format!("select={}&order=id.asc", PROFILE_COLUMNS);
        Ok(self.supabase.select(USERS, &query).await?)
    }

    pub async fn change_role(&self, user_id: i64, role: &str) -> Result<UserProfile, UserAdminError> {
        let role: Role = role.parse().map_err(UserAdminError::InvalidRole)?;
        debug!("Changing role of user {} to {}", user_id, role);

        let query = format!("id={}&select={}", eq(user_id), PROFILE_COLUMNS);
        let updated: Vec<UserProfile> = self.supabase.update(USERS, &query, json!({ "role": role })).await?;
        let profile = updated.into_iter().next().ok_or(UserAdminError::UserNotFound(user_id))?;

        info!("User {} is now {}", profile.id, profile.role);
        Ok(profile)
    }
}
