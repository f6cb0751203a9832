use chrono::Utc;

use crate::error::{AppError, AppResult};
use crate::models::{Identity, SUBMISSIONS_PATH, SubmitRequest, SubmitResponse, Submission};
use crate::store::{SharedStore, generate_push_key};
use crate::utils::{normalize_phone, validate_email};

#[derive(Clone)]
pub struct SubmissionService {
    store: SharedStore,
}

impl SubmissionService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// 保存表单提交，同一身份可多次提交
    pub async fn submit(&self, identity: &Identity, req: SubmitRequest) -> AppResult<SubmitResponse> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(AppError::ValidationError("Name is required".to_string()));
        }
        let email = req.email.trim();
        validate_email(email)?;
        let phone = normalize_phone(req.phone.as_deref())?;

        let submission = Submission {
            name: name.to_string(),
            email: email.to_string(),
            phone,
            user_id: identity.to_string(),
            timestamp: Utc::now(),
            system_info: req.system_info,
        };

        let id = generate_push_key();
        self.store
            .set(
                &format!("{SUBMISSIONS_PATH}/{id}"),
                serde_json::to_value(&submission)?,
            )
            .await?;

        log::info!("Submission {id} stored for {identity}");
        Ok(SubmitResponse { id })
    }
}
